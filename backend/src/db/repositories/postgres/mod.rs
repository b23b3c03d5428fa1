//! Postgres repository implementation using Diesel.
//!
//! The trait implementations are split per aggregate (`accommodation`,
//! `user`, `booking`, `review`, `catalog`); this module holds the
//! configuration, the connection pool and the helpers they share.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tokio::task;

use crate::api::{Accommodation, AccommodationImage, UserId};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

mod accommodation;
mod booking;
mod catalog;
mod models;
mod review;
mod schema;
mod user;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_env() -> RepositoryResult<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| {
                RepositoryError::configuration_with_context(
                    "DATABASE_URL or PG_DATABASE_URL must be set",
                    ErrorContext::new("postgres_config_from_env"),
                )
            })?;

        let defaults = Self::default();
        let config = Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> RepositoryResult<()> {
        if self.database_url.trim().is_empty() {
            return Err(RepositoryError::configuration("database_url must not be empty"));
        }
        if self.max_pool_size == 0 || self.min_pool_size > self.max_pool_size {
            return Err(RepositoryError::configuration(format!(
                "invalid pool bounds: min={} max={}",
                self.min_pool_size, self.max_pool_size
            )));
        }
        Ok(())
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        config.validate()?;
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        log::info!(
            "Postgres repository ready (pool max={}, min={})",
            config.max_pool_size,
            config.min_pool_size
        );

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        for version in applied {
            log::info!("Applied migration {}", version);
        }
        Ok(())
    }

    /// Execute a database operation on a blocking thread, retrying transient
    /// failures with exponential backoff.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            log::warn!("{}; retrying", err);
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        log::warn!("{}; retrying", e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Current pool state and query statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Returns (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        use crate::db::repository::AccommodationRepository;

        let start = Instant::now();
        let result = self.health_check().await;
        let latency = Some(start.elapsed().as_millis() as u64);
        match result {
            Ok(true) => (true, latency, None),
            Ok(false) => (false, latency, Some("Health check returned false".to_string())),
            Err(e) => (false, latency, Some(e.to_string())),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

/// Map diesel's `NotFound` to a `missing` error naming the entity.
fn or_missing(
    op: &'static str,
    entity: &'static str,
    id: impl ToString,
) -> impl FnOnce(diesel::result::Error) -> RepositoryError {
    move |err| match err {
        diesel::result::Error::NotFound => RepositoryError::missing(op, entity, id),
        other => map_diesel_error(other).with_operation(op),
    }
}

fn ensure_user(conn: &mut PgConnection, op: &'static str, id: UserId) -> RepositoryResult<()> {
    let found: bool = diesel::select(exists(app_users::table.filter(app_users::user_id.eq(id.0))))
        .get_result(conn)
        .map_err(map_diesel_error)?;
    if !found {
        return Err(RepositoryError::missing(op, "user", id));
    }
    Ok(())
}

fn ensure_accommodation(
    conn: &mut PgConnection,
    op: &'static str,
    register_number: &str,
) -> RepositoryResult<()> {
    let found: bool = diesel::select(exists(
        accommodations::table.filter(accommodations::register_number.eq(register_number)),
    ))
    .get_result(conn)
    .map_err(map_diesel_error)?;
    if !found {
        return Err(RepositoryError::missing(op, "accommodation", register_number));
    }
    Ok(())
}

/// Assemble full accommodations (location, category, images) for a batch of
/// rows, keeping the row order.
fn load_accommodations(
    conn: &mut PgConnection,
    rows: Vec<AccommodationRow>,
) -> RepositoryResult<Vec<Accommodation>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let location_ids: Vec<i64> = rows.iter().map(|r| r.location_id).collect();
    let mut locations: HashMap<i64, LocationRow> = accommodation_locations::table
        .filter(accommodation_locations::location_id.eq_any(location_ids))
        .select(LocationRow::as_select())
        .load::<LocationRow>(conn)
        .map_err(map_diesel_error)?
        .into_iter()
        .map(|row| (row.location_id, row))
        .collect();

    let category_ids: Vec<i64> = rows.iter().filter_map(|r| r.category_id).collect();
    let categories: HashMap<i64, CategoryRow> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        accommodation_categories::table
            .filter(accommodation_categories::category_id.eq_any(category_ids))
            .select(CategoryRow::as_select())
            .load::<CategoryRow>(conn)
            .map_err(map_diesel_error)?
            .into_iter()
            .map(|row| (row.category_id, row))
            .collect()
    };

    let register_numbers: Vec<String> = rows.iter().map(|r| r.register_number.clone()).collect();
    let mut images: HashMap<String, Vec<AccommodationImage>> = HashMap::new();
    let image_rows: Vec<(String, ImageRow)> = accommodation_image_links::table
        .inner_join(accommodation_images::table)
        .filter(accommodation_image_links::register_number.eq_any(register_numbers))
        .order(accommodation_images::image_id.asc())
        .select((
            accommodation_image_links::register_number,
            ImageRow::as_select(),
        ))
        .load(conn)
        .map_err(map_diesel_error)?;
    for (register_number, image) in image_rows {
        images.entry(register_number).or_default().push(image.into());
    }

    rows.into_iter()
        .map(|row| {
            let location = locations.remove(&row.location_id).ok_or_else(|| {
                RepositoryError::internal_with_context(
                    format!("Location {} is missing", row.location_id),
                    ErrorContext::new("load_accommodations")
                        .with_entity("accommodation")
                        .with_entity_id(&row.register_number),
                )
            })?;
            let category = row
                .category_id
                .and_then(|id| categories.get(&id).cloned())
                .map(Into::into);
            let images = images.remove(&row.register_number).unwrap_or_default();
            Ok(Accommodation {
                register_number: row.register_number,
                host_id: UserId(row.host_id),
                num_of_beds: row.num_of_beds,
                num_of_bathrooms: row.num_of_bathrooms,
                num_of_bedrooms: row.num_of_bedrooms,
                price_per_night: row.price_per_night,
                num_of_guests: row.num_of_guests,
                area: row.area,
                category,
                location: location.into(),
                images,
                created_at: row.created_at,
            })
        })
        .collect()
}

fn load_accommodation(
    conn: &mut PgConnection,
    op: &'static str,
    register_number: &str,
) -> RepositoryResult<Accommodation> {
    let row = accommodations::table
        .find(register_number)
        .select(AccommodationRow::as_select())
        .first::<AccommodationRow>(conn)
        .map_err(or_missing(op, "accommodation", register_number))?;
    load_accommodations(conn, vec![row])?
        .pop()
        .ok_or_else(|| RepositoryError::missing(op, "accommodation", register_number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let config = PostgresConfig {
            min_pool_size: 5,
            max_pool_size: 2,
            ..PostgresConfig::with_url("postgres://localhost/hosting")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_url() {
        assert!(PostgresConfig::default().validate().is_err());
        assert!(PostgresConfig::with_url("postgres://localhost/hosting")
            .validate()
            .is_ok());
    }
}
