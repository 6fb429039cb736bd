//! # irhub-adapter-virtual
//!
//! Virtual/demo transceiver that simulates IR blasters without hardware.
//!
//! A learn request waits for a simulated button press, injected through
//! [`VirtualTransceiver::press_button`], until the requested deadline
//! passes. Transmissions are recorded instead of sent over the air, so
//! demos and full-stack tests can assert on them.
//!
//! ## Dependency rule
//!
//! Depends on `irhub-app` (port traits) and `irhub-domain` only.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use irhub_app::ports::{LearnReply, Transceiver};
use irhub_domain::code::IrCode;
use irhub_domain::error::{IrHubError, TransmitError};

/// Simulated transceiver driving a fixed set of named blasters.
pub struct VirtualTransceiver {
    blasters: Vec<String>,
    inner: Mutex<Inner>,
    button_pressed: tokio::sync::Notify,
}

#[derive(Default)]
struct Inner {
    pressed: VecDeque<IrCode>,
    transmitted: Vec<(String, IrCode)>,
}

impl VirtualTransceiver {
    pub fn new(blasters: Vec<String>) -> Self {
        Self {
            blasters,
            inner: Mutex::new(Inner::default()),
            button_pressed: tokio::sync::Notify::new(),
        }
    }

    /// Simulate a button press on the physical remote: the next learn
    /// request in flight (or the next one to start) captures `code`.
    pub fn press_button(&self, code: IrCode) {
        self.lock_inner().pressed.push_back(code);
        self.button_pressed.notify_waiters();
    }

    /// Codes transmitted so far, with the blaster each went through.
    pub fn transmitted(&self) -> Vec<(String, IrCode)> {
        self.lock_inner().transmitted.clone()
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for VirtualTransceiver {
    fn default() -> Self {
        Self::new(vec!["remote.virtual_blaster".to_string()])
    }
}

impl Transceiver for VirtualTransceiver {
    async fn blasters(&self) -> Vec<String> {
        self.blasters.clone()
    }

    async fn request_learn(
        &self,
        blaster: &str,
        deadline: std::time::Duration,
    ) -> Result<LearnReply, IrHubError> {
        tracing::debug!(blaster, "virtual blaster listening");
        let give_up_at = tokio::time::Instant::now() + deadline;
        loop {
            // register for wakeup before checking, so a press between the
            // check and the await is not lost
            let mut pressed = std::pin::pin!(self.button_pressed.notified());
            pressed.as_mut().enable();
            if let Some(code) = self.lock_inner().pressed.pop_front() {
                return Ok(LearnReply::Code(code));
            }
            if tokio::time::timeout_at(give_up_at, pressed).await.is_err() {
                return Ok(LearnReply::Timeout);
            }
        }
    }

    async fn transmit(&self, blaster: &str, code: &IrCode) -> Result<(), TransmitError> {
        if !self.blasters.iter().any(|known| known == blaster) {
            return Err(TransmitError {
                blaster: blaster.to_string(),
                reason: "unknown blaster".to_string(),
            });
        }
        tracing::debug!(blaster, code = %code, "virtual blaster transmitting");
        self.lock_inner()
            .transmitted
            .push((blaster.to_string(), code.clone()));
        Ok(())
    }
}
