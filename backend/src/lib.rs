//! # Hosting API
//!
//! Backend for an accommodation-hosting marketplace: hosts list
//! accommodations, guests search and book them, and both sides leave reviews.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Identifier newtypes and the domain records exchanged over the API
//! - [`models`]: Domain record definitions
//! - [`db`]: Repository traits, the in-memory and PostgreSQL backends, and
//!   repository-agnostic business operations
//! - [`services`]: Search, validation, geo distance and password hashing
//! - [`http`]: Axum-based HTTP server and request handlers
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
