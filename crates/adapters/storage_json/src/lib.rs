//! # irhub-adapter-storage-json
//!
//! JSON file persistence adapter for the registry snapshot.
//!
//! ## Responsibilities
//! - Implement the `SnapshotStore` port defined in `irhub-app::ports::storage`
//! - Guarantee atomic replacement: write to a temporary sibling file, then
//!   rename over the destination, so no reader or subsequent process start
//!   ever observes a partial snapshot
//! - Refuse snapshots written by a newer schema version instead of
//!   misreading them
//!
//! ## Dependency rule
//! Depends on `irhub-app` (for the port trait) and `irhub-domain` (for the
//! snapshot document). The `app` and `domain` crates must never reference
//! this adapter.

pub mod store;

pub use store::JsonSnapshotStore;
