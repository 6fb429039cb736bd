//! In-memory [`EntityHost`] keyed by entity id.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use irhub_domain::entity::ExposedEntity;

use crate::ports::EntityHost;

/// In-process entity host backed by a `BTreeMap` for deterministic listing.
#[derive(Debug, Default)]
pub struct InMemoryEntityHost {
    entities: RwLock<BTreeMap<String, ExposedEntity>>,
}

impl InMemoryEntityHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityHost for InMemoryEntityHost {
    async fn list(&self) -> Vec<ExposedEntity> {
        self.entities.read().await.values().cloned().collect()
    }

    async fn upsert(&self, entity: ExposedEntity) {
        self.entities
            .write()
            .await
            .insert(entity.entity_id().to_string(), entity);
    }

    async fn remove(&self, entity_id: &str) {
        self.entities.write().await.remove(entity_id);
    }
}
