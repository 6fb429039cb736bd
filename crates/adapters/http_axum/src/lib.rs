//! # irhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **REST JSON API** for programmatic access
//!   (`/api/devices`, `/api/entities`, `/api/learn`, `/api/wizard`, …)
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application errors into HTTP status codes and JSON bodies
//!
//! ## Dependency rule
//! Depends on `irhub-app` (for port traits and services) and `irhub-domain`
//! (for domain types used in request/response mapping). Never leaks axum
//! types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
