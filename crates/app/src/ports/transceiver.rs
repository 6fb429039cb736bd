//! Transceiver port — the external IR learn/transmit capability.
//!
//! The core never assumes a specific transceiver implementation; anything
//! that can put a blaster into learning mode and replay an opaque code is
//! acceptable.

use std::future::Future;
use std::time::Duration;

use irhub_domain::code::IrCode;
use irhub_domain::error::{IrHubError, TransmitError};

/// What a learn request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnReply {
    /// A code was captured within the deadline.
    Code(IrCode),
    /// The transceiver gave up without seeing a signal.
    Timeout,
}

/// An external IR transceiver capability.
pub trait Transceiver {
    /// Blaster references this transceiver can drive, for wizard selection.
    fn blasters(&self) -> impl Future<Output = Vec<String>> + Send;

    /// Put `blaster` into learning mode and wait up to `deadline` for a
    /// button press. The [`LearningCoordinator`](crate::learning) enforces
    /// its own deadline as well, so implementations that ignore `deadline`
    /// cannot wedge the process.
    fn request_learn(
        &self,
        blaster: &str,
        deadline: Duration,
    ) -> impl Future<Output = Result<LearnReply, IrHubError>> + Send;

    /// Best-effort request to stop listening after a cancellation or a
    /// coordinator-side timeout. The default does nothing.
    fn stop_learn(&self, blaster: &str) -> impl Future<Output = ()> + Send {
        let _ = blaster;
        async {}
    }

    /// Transmit a previously captured code through `blaster`.
    fn transmit(
        &self,
        blaster: &str,
        code: &IrCode,
    ) -> impl Future<Output = Result<(), TransmitError>> + Send;
}

impl<T: Transceiver + Send + Sync> Transceiver for std::sync::Arc<T> {
    fn blasters(&self) -> impl Future<Output = Vec<String>> + Send {
        (**self).blasters()
    }

    fn request_learn(
        &self,
        blaster: &str,
        deadline: Duration,
    ) -> impl Future<Output = Result<LearnReply, IrHubError>> + Send {
        (**self).request_learn(blaster, deadline)
    }

    fn stop_learn(&self, blaster: &str) -> impl Future<Output = ()> + Send {
        (**self).stop_learn(blaster)
    }

    fn transmit(
        &self,
        blaster: &str,
        code: &IrCode,
    ) -> impl Future<Output = Result<(), TransmitError>> + Send {
        (**self).transmit(blaster, code)
    }
}
