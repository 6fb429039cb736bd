//! Common error types used across the workspace.
//!
//! Each failure class has its own typed error; [`IrHubError`] aggregates them
//! with `#[from]` conversions so layers can bubble errors with `?`. No error
//! kind is fatal to the process — callers either retry or surface the error
//! as a typed result.

/// Top-level error for all irhub operations.
#[derive(Debug, thiserror::Error)]
pub enum IrHubError {
    /// A domain invariant was violated by caller input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced device or command does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A uniqueness constraint was violated.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// A learning session is already active.
    #[error(transparent)]
    Busy(#[from] BusyError),

    /// A code payload was malformed or empty.
    #[error(transparent)]
    InvalidPayload(#[from] InvalidPayloadError),

    /// A learning session ended without capturing a code.
    #[error("learning timed out before a code was captured")]
    LearnTimeout,

    /// A learning session was cancelled by the caller.
    #[error("learning was cancelled")]
    LearnCancelled,

    /// The transceiver failed to transmit a code.
    #[error(transparent)]
    Transmit(#[from] TransmitError),

    /// The snapshot store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A name was empty after trimming surrounding whitespace.
    #[error("name must not be empty")]
    EmptyName,
    /// An input was submitted that the current flow step does not accept.
    #[error("input does not apply to step '{step}'")]
    UnexpectedInput {
        /// Identifier of the step the flow was in.
        step: String,
    },
    /// A command was stored under a key that does not match its name.
    #[error("command '{name}' is stored under mismatched key '{key}'")]
    MismatchedCommandKey {
        /// The key the command is stored under.
        key: String,
        /// The command's display name.
        name: String,
    },
}

/// A referenced object does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} '{id}' not found")]
pub struct NotFoundError {
    /// Kind of object, e.g. `"Device"` or `"Command"`.
    pub entity: &'static str,
    /// Identifier or name that was looked up.
    pub id: String,
}

/// A uniqueness constraint was violated.
#[derive(Debug, thiserror::Error)]
#[error("{entity} named '{name}' already exists")]
pub struct ConflictError {
    /// Kind of object, e.g. `"Device"`.
    pub entity: &'static str,
    /// The conflicting name.
    pub name: String,
}

/// Another learning session is already in progress.
///
/// Learning cannot be multiplexed — it waits for a single physical
/// button press — so concurrent attempts fail fast instead of queuing.
#[derive(Debug, thiserror::Error)]
#[error("a learning session for command '{pending_command}' is already active")]
pub struct BusyError {
    /// Name of the command the active session is waiting for.
    pub pending_command: String,
}

/// Malformed or empty code payloads.
#[derive(Debug, thiserror::Error)]
pub enum InvalidPayloadError {
    /// The decoded payload contained zero bytes.
    #[error("code payload must not be empty")]
    EmptyCode,
    /// The base64 text could not be decoded.
    #[error("invalid base64 code")]
    Base64(#[from] base64::DecodeError),
}

/// The transceiver reported a transmission failure.
#[derive(Debug, thiserror::Error)]
#[error("transmit via blaster '{blaster}' failed: {reason}")]
pub struct TransmitError {
    /// The blaster that was asked to transmit.
    pub blaster: String,
    /// Transceiver-reported cause.
    pub reason: String,
}

/// Snapshot persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying filesystem failure.
    #[error("snapshot io failed")]
    Io(#[from] std::io::Error),
    /// The snapshot could not be serialized or deserialized.
    #[error("snapshot encoding failed")]
    Serde(#[from] serde_json::Error),
    /// The snapshot on disk is unreadable or from an unsupported schema
    /// version. Recovered at startup by starting empty, never fatal.
    #[error("snapshot is corrupt: {reason}")]
    Corrupt {
        /// Human-readable cause.
        reason: String,
    },
}
