//! Entity host port — the externally exposed entity set.
//!
//! The synchronizer diffs the registry-derived desired set against whatever
//! the host currently exposes. Hosts are dumb: they hold entities, they do
//! not derive them.

use std::future::Future;

use irhub_domain::entity::ExposedEntity;

/// Holds the currently exposed entities.
pub trait EntityHost {
    /// All currently exposed entities, in deterministic order.
    fn list(&self) -> impl Future<Output = Vec<ExposedEntity>> + Send;

    /// Create or replace an entity under its `entity_id`.
    fn upsert(&self, entity: ExposedEntity) -> impl Future<Output = ()> + Send;

    /// Remove an entity. Removing an unknown id is a no-op.
    fn remove(&self, entity_id: &str) -> impl Future<Output = ()> + Send;
}

impl<T: EntityHost + Send + Sync> EntityHost for std::sync::Arc<T> {
    fn list(&self) -> impl Future<Output = Vec<ExposedEntity>> + Send {
        (**self).list()
    }

    fn upsert(&self, entity: ExposedEntity) -> impl Future<Output = ()> + Send {
        (**self).upsert(entity)
    }

    fn remove(&self, entity_id: &str) -> impl Future<Output = ()> + Send {
        (**self).remove(entity_id)
    }
}
