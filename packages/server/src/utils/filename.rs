/// Longest file name kept for an upload, in characters.
pub const MAX_FILENAME_CHARS: usize = 255;

/// Why a client-supplied file name was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    Empty,
    NullByte,
    /// CR, LF and friends would allow header injection via `Content-Disposition`.
    ControlCharacter,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "File name cannot be empty",
            Self::NullByte => "Invalid file name: null bytes are not allowed",
            Self::ControlCharacter => "Invalid file name: control characters are not allowed",
        }
    }
}

/// Reduce a multipart file name to the name shown in chat and resources.
///
/// Some browsers send a full client path (`C:\fakepath\notes.pdf`), so
/// only the last component is kept. Long names are truncated.
pub fn display_name(raw: &str) -> Result<String, FilenameError> {
    if raw.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    if last.is_empty() || last == "." || last == ".." {
        return Err(FilenameError::Empty);
    }
    if last.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    Ok(last.chars().take(MAX_FILENAME_CHARS).collect())
}

/// `Content-Disposition` value with an ASCII fallback and an RFC 5987
/// `filename*` carrying the exact name.
pub fn content_disposition(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .map(|c| if matches!(c, '"' | '\\' | ';') { '_' } else { c })
        .collect();
    let ascii = if ascii.trim().is_empty() {
        "download".to_string()
    } else {
        ascii
    };

    let encoded: String = name
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("inline; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}
