//! Byte storage seam.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use vermeer_error::StorageError;

/// Persistence collaborator for downloaded assets.
///
/// The core never touches disks (or MTP devices) directly: it hands byte
/// buffers to an implementation of this trait and records the returned
/// paths. Implementations live with the excluded file-handling layer.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Read previously stored bytes.
    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Persist bytes under the given path, returning the path actually used.
    async fn save_bytes(&self, path: &Path, bytes: &[u8]) -> Result<PathBuf, StorageError>;

    /// True when an asset already exists at the path.
    async fn file_exists(&self, path: &Path) -> bool;
}
