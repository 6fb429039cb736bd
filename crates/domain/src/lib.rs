//! # irhub-domain
//!
//! Pure domain model for the irhub virtual-remote manager.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **virtual remotes** (named devices bound to an IR transceiver)
//!   and their **commands** (named, opaque IR codes)
//! - Define **IR codes** (opaque byte payloads, base64 at every boundary)
//! - Define **exposed entities** (one remote plus one button per command)
//!   and the deterministic derivation of their identifiers
//! - Define the versioned **registry snapshot** document that is persisted
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod code;
pub mod entity;
pub mod error;
pub mod id;
pub mod remote;
pub mod snapshot;
pub mod time;
