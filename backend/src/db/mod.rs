//! Storage for the hosting marketplace.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers (crate::http)                            │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service layer (services.rs)                            │
//! │  - validation, password hashing                         │
//! │  - host roles, guest capacity, booking prices           │
//! │  - search history                                       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/)                        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                │
//! ┌───▼──────────────────┐  ┌──────────▼──────────────┐
//! │ Postgres repository  │  │ Local repository        │
//! │ (diesel + r2d2)      │  │ (in-memory)             │
//! └──────────────────────┘  └─────────────────────────┘
//! ```
//!
//! # Usage
//! ```ignore
//! use hosting_api::db::{services, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_env().await?;
//!     let healthy = services::health_check(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AccommodationRepository, BookingRepository, CatalogRepository, ErrorContext, FullRepository,
    RepositoryError, RepositoryResult, ReviewRepository, UserRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository from the environment.
///
/// Later calls return the instance created by the first one.
pub async fn init_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo);
    }

    let repo = RepositoryFactory::from_env()
        .await
        .context("Failed to initialize repository")?;
    Ok(REPOSITORY.get_or_init(|| repo))
}

/// The global repository; fails until [`init_repository`] has run.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
