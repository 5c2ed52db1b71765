//! Document storage collaborator. The ledger only ever asks it to
//! release a receipt that is no longer referenced by an active claim;
//! uploads are handled entirely outside the engine.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{LedgerError, Result};

/// Deletes stored expense documents. Implementations must tolerate
/// paths that no longer exist.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Stores documents as plain files under one upload directory. Only
/// the final path component of a stored reference is honored, so a
/// reference can never escape the directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    upload_dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        Path::new(reference)
            .file_name()
            .map(|name| self.upload_dir.join(name))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn delete(&self, reference: &str) -> Result<()> {
        let Some(path) = self.resolve(reference) else {
            warn!("Document reference '{}' has no file name", reference);
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted document {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Document not found for deletion: {}", path.display());
                Ok(())
            }
            Err(e) => Err(LedgerError::Storage(format!(
                "failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Store that drops nothing; for deployments without uploads.
#[derive(Debug, Clone, Default)]
pub struct NoopDocumentStore;

#[async_trait]
impl DocumentStore for NoopDocumentStore {
    async fn delete(&self, _reference: &str) -> Result<()> {
        Ok(())
    }
}
