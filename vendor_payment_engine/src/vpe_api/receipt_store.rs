use std::path::{Path, PathBuf};

use log::*;
use thiserror::Error;

use crate::helpers::ReceiptMime;

#[derive(Debug, Clone, Error)]
pub enum ReceiptStoreError {
    #[error("Could not write receipt: {0}")]
    Io(String),
    #[error("Refusing to store a receipt under the name {0}")]
    InvalidName(String),
}

impl From<std::io::Error> for ReceiptStoreError {
    fn from(e: std::io::Error) -> Self {
        ReceiptStoreError::Io(e.to_string())
    }
}

/// Somewhere to keep uploaded receipts.
#[allow(async_fn_in_trait)]
pub trait ReceiptStore {
    /// Stores the bytes under `name` and returns the public URL they can be fetched from.
    async fn store(&self, name: &str, bytes: &[u8], mime: ReceiptMime) -> Result<String, ReceiptStoreError>;
    /// Deletes a receipt stored under `name`. Removing a receipt that is not there is not an error.
    async fn remove(&self, name: &str) -> Result<(), ReceiptStoreError>;
}

/// Keeps receipts as plain files in a directory that is served at `base_url`.
#[derive(Debug, Clone)]
pub struct LocalReceiptStore {
    root: PathBuf,
    base_url: String,
}

impl LocalReceiptStore {
    pub fn new<P: Into<PathBuf>>(root: P, base_url: &str) -> Self {
        Self { root: root.into(), base_url: base_url.trim_end_matches('/').to_string() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_safe_name(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('.')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }
}

impl ReceiptStore for LocalReceiptStore {
    async fn store(&self, name: &str, bytes: &[u8], mime: ReceiptMime) -> Result<String, ReceiptStoreError> {
        if !Self::is_safe_name(name) {
            return Err(ReceiptStoreError::InvalidName(name.to_string()));
        }
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes).await?;
        debug!("🧾️ Stored {} receipt ({} bytes) at {}", mime.mime_type(), bytes.len(), path.display());
        Ok(format!("{}/{name}", self.base_url))
    }

    async fn remove(&self, name: &str) -> Result<(), ReceiptStoreError> {
        if !Self::is_safe_name(name) {
            return Err(ReceiptStoreError::InvalidName(name.to_string()));
        }
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
