//! Shared in-memory port stubs for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use irhub_domain::code::IrCode;
use irhub_domain::error::{IrHubError, StorageError, TransmitError};
use irhub_domain::snapshot::RegistrySnapshot;

use crate::ports::{LearnReply, SnapshotStore, Transceiver};

/// In-memory [`SnapshotStore`] with failure injection.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    saved: Mutex<Option<RegistrySnapshot>>,
    corrupt: AtomicBool,
    fail_next_save: AtomicBool,
}

impl MemoryStore {
    /// A store whose load reports a corrupt snapshot.
    pub fn corrupt() -> Self {
        let store = Self::default();
        store.inner.corrupt.store(true, Ordering::SeqCst);
        store
    }

    /// Make the next `save` call fail with a storage error.
    pub fn fail_next_save(&self) {
        self.inner.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// The last successfully saved snapshot.
    pub fn saved(&self) -> Option<RegistrySnapshot> {
        self.inner.saved.lock().unwrap().clone()
    }
}

impl SnapshotStore for MemoryStore {
    async fn load(&self) -> Result<Option<RegistrySnapshot>, IrHubError> {
        if self.inner.corrupt.load(Ordering::SeqCst) {
            return Err(StorageError::Corrupt {
                reason: "injected".to_string(),
            }
            .into());
        }
        Ok(self.inner.saved.lock().unwrap().clone())
    }

    async fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), IrHubError> {
        if self.inner.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Corrupt {
                reason: "injected save failure".to_string(),
            }
            .into());
        }
        *self.inner.saved.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
}

/// What a [`ScriptedTransceiver`] should answer to the next learn request.
pub enum ScriptedReply {
    /// Resolve immediately with a captured code.
    Code(IrCode),
    /// Resolve immediately with a transceiver-side timeout.
    Timeout,
    /// Never resolve — forces the coordinator to enforce its own deadline.
    Hang,
    /// Resolve with a code after a delay.
    Delayed(Duration, IrCode),
}

/// Scriptable [`Transceiver`] recording everything that was transmitted.
pub struct ScriptedTransceiver {
    blasters: Vec<String>,
    replies: Mutex<VecDeque<ScriptedReply>>,
    sent: Mutex<Vec<(String, IrCode)>>,
    stops: AtomicUsize,
    fail_transmit: AtomicBool,
}

impl Default for ScriptedTransceiver {
    fn default() -> Self {
        Self {
            blasters: vec!["remote.blaster_x".to_string()],
            replies: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            fail_transmit: AtomicBool::new(false),
        }
    }
}

impl ScriptedTransceiver {
    /// Queue the answer for the next learn request.
    pub fn script(&self, reply: ScriptedReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Make every transmit fail.
    pub fn fail_transmit(&self) {
        self.fail_transmit.store(true, Ordering::SeqCst);
    }

    /// Everything transmitted so far, as `(blaster, code)` pairs.
    pub fn sent(&self) -> Vec<(String, IrCode)> {
        self.sent.lock().unwrap().clone()
    }

    /// How many times `stop_learn` was called.
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Transceiver for ScriptedTransceiver {
    async fn blasters(&self) -> Vec<String> {
        self.blasters.clone()
    }

    async fn request_learn(
        &self,
        _blaster: &str,
        deadline: Duration,
    ) -> Result<LearnReply, IrHubError> {
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(ScriptedReply::Code(code)) => Ok(LearnReply::Code(code)),
            Some(ScriptedReply::Timeout) => Ok(LearnReply::Timeout),
            Some(ScriptedReply::Hang) => std::future::pending().await,
            Some(ScriptedReply::Delayed(delay, code)) => {
                tokio::time::sleep(delay).await;
                Ok(LearnReply::Code(code))
            }
            None => {
                tokio::time::sleep(deadline).await;
                Ok(LearnReply::Timeout)
            }
        }
    }

    async fn stop_learn(&self, _blaster: &str) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    async fn transmit(&self, blaster: &str, code: &IrCode) -> Result<(), TransmitError> {
        if self.fail_transmit.load(Ordering::SeqCst) {
            return Err(TransmitError {
                blaster: blaster.to_string(),
                reason: "injected transmit failure".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((blaster.to_string(), code.clone()));
        Ok(())
    }
}
