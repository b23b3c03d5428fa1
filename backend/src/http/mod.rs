//! HTTP server module for the hosting backend.
//!
//! This module exposes the repository and service layers as a REST API
//! built on axum.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Request parsing, caller identity (X-User-Id)           │
//! │  - JSON bodies, CORS, compression, error mapping          │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (db::services)                             │
//! │  - Validation, password hashing, roles, booking prices    │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (db/)                                   │
//! │  - LocalRepository / PostgresRepository                   │
//! └──────────────────────────────────────────────────────────┘
//! ```

#[cfg(feature = "http-server")]
pub mod auth;

#[cfg(feature = "http-server")]
pub mod handlers;

#[cfg(feature = "http-server")]
pub mod router;

#[cfg(feature = "http-server")]
pub mod state;

#[cfg(feature = "http-server")]
pub mod error;

#[cfg(feature = "http-server")]
pub mod dto;

#[cfg(feature = "http-server")]
pub mod extract;

#[cfg(feature = "http-server")]
pub use router::create_router;

#[cfg(feature = "http-server")]
pub use state::AppState;
