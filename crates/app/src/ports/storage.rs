//! Storage port — durable persistence for the registry snapshot.

use std::future::Future;

use irhub_domain::error::IrHubError;
use irhub_domain::snapshot::RegistrySnapshot;

/// Persists the full registry snapshot.
///
/// Implementations must make a saved snapshot atomic: a reader (or a
/// subsequent process start) must never observe a partial write.
pub trait SnapshotStore {
    /// Load the last complete snapshot.
    ///
    /// Returns `Ok(None)` when no snapshot has ever been written, and a
    /// [`StorageError::Corrupt`](irhub_domain::error::StorageError::Corrupt)
    /// when one exists but cannot be read.
    fn load(&self) -> impl Future<Output = Result<Option<RegistrySnapshot>, IrHubError>> + Send;

    /// Durably store a complete snapshot, replacing any previous one.
    fn save(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> impl Future<Output = Result<(), IrHubError>> + Send;
}

impl<T: SnapshotStore + Send + Sync> SnapshotStore for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Option<RegistrySnapshot>, IrHubError>> + Send {
        (**self).load()
    }

    fn save(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> impl Future<Output = Result<(), IrHubError>> + Send {
        (**self).save(snapshot)
    }
}
