//! Wire protocol of the room chat channel.
//!
//! Every WebSocket text frame carries one event encoded as
//! `{"event": "<name>", "data": {...}}`. Payload fields are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kind::MessageKind;

/// Events a client may send.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "joinRoom")]
    JoinRoom(JoinRoom),
    #[serde(rename = "message")]
    Message(SendText),
    #[serde(rename = "fileUpload")]
    FileUpload(SendFile),
    #[serde(rename = "typing")]
    Typing(Typing),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub room_id: i32,
    /// Informational. The server trusts the authenticated connection.
    #[serde(default)]
    pub user_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendText {
    pub room_id: i32,
    #[serde(default)]
    pub sender_id: Option<i32>,
    pub text: String,
    /// Opaque token echoed back in the matching [`Ack`].
    #[serde(default)]
    pub client_ref: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFile {
    pub room_id: i32,
    #[serde(default)]
    pub sender_id: Option<i32>,
    pub file_url: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub client_ref: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typing {
    pub room_id: i32,
    #[serde(default)]
    pub user_id: Option<i32>,
    pub is_typing: bool,
}

/// Events the server pushes to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "message")]
    Message(ChatMessagePayload),
    #[serde(rename = "fileUpload")]
    FileUpload(ChatMessagePayload),
    #[serde(rename = "typing")]
    Typing(TypingNotice),
    #[serde(rename = "userJoined")]
    UserJoined(PresenceNotice),
    #[serde(rename = "userLeft")]
    UserLeft(PresenceNotice),
    /// Confirms a `joinRoom` to the joining connection.
    #[serde(rename = "joined")]
    Joined(Joined),
    #[serde(rename = "ack")]
    Ack(Ack),
    #[serde(rename = "error")]
    Error(ErrorNotice),
}

/// A persisted chat message as broadcast to the room.
///
/// `messageType`, `fileUrl` and `fileName` are only present for file
/// messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    #[serde(rename = "_id")]
    pub id: i32,
    pub sender: i32,
    pub chat_room: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessagePayload {
    /// Wrap the payload in the event matching its kind.
    pub fn into_event(self) -> ServerEvent {
        match self.message_type {
            Some(MessageKind::File) => ServerEvent::FileUpload(self),
            _ => ServerEvent::Message(self),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub user_id: i32,
    pub is_typing: bool,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceNotice {
    pub user_id: i32,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Joined {
    pub room_id: i32,
    pub present_user_ids: Vec<i32>,
}

/// Outcome of a `message` or `fileUpload`, sent only to its sender.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    #[serde(default)]
    pub client_ref: Option<String>,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    pub fn accepted(client_ref: Option<String>, message_id: i32) -> Self {
        Self {
            client_ref,
            ok: true,
            message_id: Some(message_id),
            error: None,
        }
    }

    pub fn rejected(client_ref: Option<String>, error: impl Into<String>) -> Self {
        Self {
            client_ref,
            ok: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub message: String,
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorNotice {
            message: message.into(),
        })
    }
}
