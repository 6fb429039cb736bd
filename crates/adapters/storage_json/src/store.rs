//! File-backed [`SnapshotStore`] with write-temp-then-rename replacement.

use std::path::{Path, PathBuf};

use irhub_app::ports::SnapshotStore;
use irhub_domain::error::{IrHubError, StorageError};
use irhub_domain::snapshot::RegistrySnapshot;

/// Stores the registry snapshot as a single pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The destination file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonSnapshotStore {
    async fn load(&self) -> Result<Option<RegistrySnapshot>, IrHubError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::Io(err).into()),
        };
        let snapshot: RegistrySnapshot =
            serde_json::from_slice(&bytes).map_err(|err| StorageError::Corrupt {
                reason: err.to_string(),
            })?;
        if !snapshot.is_readable() {
            return Err(StorageError::Corrupt {
                reason: format!("unsupported schema version {}", snapshot.version),
            }
            .into());
        }
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), IrHubError> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(StorageError::Serde)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(StorageError::Io)?;
            }
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(StorageError::Io)?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(StorageError::Io)?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }
}
