use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{BoxReader, FileStore};

const READ_CHUNK: usize = 64 * 1024;

/// [`FileStore`] backed by a local directory.
///
/// Files live at `{root}/{shard}/{leaf}` (see [`ContentHash::shard`]).
/// Writes go to `{root}/.incoming` first and are renamed into place once
/// the hash is known, so a half-written upload is never visible.
pub struct FilesystemFileStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemFileStore {
    pub async fn new(root: impl Into<PathBuf>, max_size: u64) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(root.join(".incoming")).await?;
        Ok(Self { root, max_size })
    }

    fn path_for(&self, hash: &ContentHash) -> PathBuf {
        self.root.join(hash.shard()).join(hash.leaf())
    }

    fn incoming_path(&self) -> PathBuf {
        self.root
            .join(".incoming")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Move a fully written temp file to its content address.
    async fn commit(&self, temp: &Path, hash: &ContentHash) -> Result<(), StorageError> {
        let target = self.path_for(hash);
        if fs::try_exists(&target).await? {
            let _ = fs::remove_file(temp).await;
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Err(e) = fs::rename(temp, &target).await {
            let _ = fs::remove_file(temp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for FilesystemFileStore {
    async fn put_stream(&self, mut reader: BoxReader) -> Result<ContentHash, StorageError> {
        let temp = self.incoming_path();
        let mut file = fs::File::create(&temp).await?;
        let mut hasher = Sha256::new();
        let mut written: u64 = 0;
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    drop(file);
                    let _ = fs::remove_file(&temp).await;
                    return Err(e.into());
                }
            };
            written += n as u64;
            if written > self.max_size {
                drop(file);
                let _ = fs::remove_file(&temp).await;
                return Err(StorageError::TooLarge {
                    actual: written,
                    limit: self.max_size,
                });
            }
            hasher.update(&buf[..n]);
            file.write_all(&buf[..n]).await?;
        }

        file.flush().await?;
        drop(file);

        let hash = ContentHash::from_digest(hasher.finalize().into());
        self.commit(&temp, &hash).await?;
        Ok(hash)
    }

    async fn open(&self, hash: &ContentHash) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.path_for(hash)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(hash.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.path_for(hash)).await?)
    }
}
