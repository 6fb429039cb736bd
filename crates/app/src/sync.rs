//! Entity synchronizer — reconciles exposed entities with the registry.
//!
//! Reconciliation is declarative: the registry is the single source of
//! truth and each pass converges the entity host to the desired set,
//! whatever order the triggering mutations arrived in. Requests that
//! arrive while a pass is running are coalesced into one follow-up pass.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use irhub_domain::entity::{ExposedEntity, desired_entities};
use irhub_domain::error::IrHubError;

use crate::ports::{EntityHost, SnapshotStore};
use crate::registry::CommandRegistry;

/// What a reconciliation pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.removed == 0
    }
}

pub struct EntitySynchronizer<S, H> {
    registry: Arc<CommandRegistry<S>>,
    host: H,
    pending: AtomicUsize,
    running: tokio::sync::Mutex<()>,
}

impl<S, H> EntitySynchronizer<S, H>
where
    S: SnapshotStore + Send + Sync,
    H: EntityHost + Send + Sync,
{
    pub fn new(registry: Arc<CommandRegistry<S>>, host: H) -> Self {
        Self {
            registry,
            host,
            pending: AtomicUsize::new(0),
            running: tokio::sync::Mutex::new(()),
        }
    }

    /// Request a reconciliation and wait until the entity host reflects
    /// every change made before this call.
    ///
    /// Callers that land while a pass is in flight share the follow-up
    /// pass instead of each running their own. The returned report covers
    /// the pass this call observed; absorbed callers may see a no-op.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from reading the registry.
    #[tracing::instrument(skip(self))]
    pub async fn request_sync(&self) -> Result<SyncReport, IrHubError> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let _running = self.running.lock().await;
        let mut report = SyncReport::default();
        while self.pending.swap(0, Ordering::SeqCst) > 0 {
            let pass = self.reconcile().await?;
            report.created += pass.created;
            report.updated += pass.updated;
            report.removed += pass.removed;
        }
        if !report.is_noop() {
            tracing::info!(
                created = report.created,
                updated = report.updated,
                removed = report.removed,
                "entities reconciled"
            );
        }
        Ok(report)
    }

    async fn reconcile(&self) -> Result<SyncReport, IrHubError> {
        let mut desired: BTreeMap<String, ExposedEntity> = BTreeMap::new();
        for device in self.registry.get_devices().await {
            for entity in desired_entities(&device) {
                desired.insert(entity.entity_id().to_string(), entity);
            }
        }

        let current: BTreeMap<String, ExposedEntity> = self
            .host
            .list()
            .await
            .into_iter()
            .map(|entity| (entity.entity_id().to_string(), entity))
            .collect();

        let mut report = SyncReport::default();
        for (entity_id, entity) in &desired {
            match current.get(entity_id) {
                Some(existing) if existing == entity => {}
                Some(_) => {
                    self.host.upsert(entity.clone()).await;
                    report.updated += 1;
                }
                None => {
                    self.host.upsert(entity.clone()).await;
                    report.created += 1;
                }
            }
        }
        for entity_id in current.keys() {
            if !desired.contains_key(entity_id) {
                self.host.remove(entity_id).await;
                report.removed += 1;
            }
        }
        Ok(report)
    }
}

/// Subscribe to registry events and reconcile after every mutation.
///
/// Lagged receivers are fine: a missed event only means a missed trigger,
/// and the next pass converges on the full desired set anyway, so on lag
/// we simply reconcile once.
pub fn spawn_on_events<S, H>(synchronizer: Arc<EntitySynchronizer<S, H>>) -> tokio::task::JoinHandle<()>
where
    S: SnapshotStore + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let mut events = synchronizer.registry.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                    if let Err(err) = synchronizer.request_sync().await {
                        tracing::warn!(error = %err, "entity sync failed");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
