//! Repository factory: picks and builds the storage backend at runtime.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresRepository;
use super::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use super::PostgresConfig;

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel implementation
    Postgres,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Accepts "postgres", "pg" and "local", ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Read `REPOSITORY_TYPE`; without it, Postgres when a database URL is
    /// present, otherwise Local.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or_else(|e| {
                log::warn!("{}; falling back to the local repository", e);
                Self::Local
            });
        }

        if std::env::var("DATABASE_URL").is_ok() || std::env::var("PG_DATABASE_URL").is_ok() {
            Self::Postgres
        } else {
            Self::Local
        }
    }
}

fn invalid_type(operation: &str, err: String) -> RepositoryError {
    RepositoryError::configuration_with_context(
        format!("Invalid repository type: {}", err),
        ErrorContext::new(operation),
    )
}

#[cfg(not(feature = "postgres-repo"))]
fn postgres_disabled(operation: &str) -> RepositoryError {
    RepositoryError::configuration_with_context(
        "Postgres repository feature not enabled",
        ErrorContext::new(operation),
    )
}

/// Creates repository instances.
///
/// # Example
/// ```ignore
/// use hosting_api::db::{RepositoryFactory, RepositoryType};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let repo = RepositoryFactory::create(RepositoryType::Local, None).await?;
///     assert!(repo.health_check().await?);
///     Ok(())
/// }
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository of the given type.
    ///
    /// # Arguments
    /// * `repo_type` - Type of repository to create
    /// * `postgres_config` - Database configuration (required for Postgres)
    pub async fn create(
        repo_type: RepositoryType,
        postgres_config: Option<&PostgresConfig>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                {
                    let config = postgres_config.ok_or_else(|| {
                        RepositoryError::configuration_with_context(
                            "Postgres repository requires PostgresConfig",
                            ErrorContext::new("create_repository"),
                        )
                    })?;
                    let pg = Self::create_postgres(config).await?;
                    Ok(pg as Arc<dyn FullRepository>)
                }
                #[cfg(not(feature = "postgres-repo"))]
                {
                    let _ = postgres_config;
                    Err(postgres_disabled("create_repository"))
                }
            }
            RepositoryType::Local => Ok(Self::create_local()),
        }
    }

    /// Create a Postgres repository; runs pending migrations.
    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<PostgresRepository>> {
        let config = config.clone();
        let repo = tokio::task::spawn_blocking(move || PostgresRepository::new(config))
            .await
            .map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Task join error: {}", e),
                    ErrorContext::new("create_postgres"),
                )
            })??;
        Ok(Arc::new(repo))
    }

    /// Create an empty in-memory repository.
    pub fn create_local() -> Arc<dyn FullRepository> {
        log::info!("Using in-memory local repository");
        Arc::new(LocalRepository::new())
    }

    /// Create a repository from environment variables.
    pub async fn from_env() -> RepositoryResult<Arc<dyn FullRepository>> {
        let builder = RepositoryBuilder::new().from_env()?;
        builder.build().await
    }

    /// Create a repository from a TOML configuration file.
    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        RepositoryBuilder::new()
            .from_config_file(config_path)?
            .build()
            .await
    }

    /// Create a repository from the first `repository.toml` found in the
    /// standard locations.
    pub async fn from_default_config() -> RepositoryResult<Arc<dyn FullRepository>> {
        RepositoryBuilder::new().from_default_config()?.build().await
    }
}

/// Fluent configuration for repository creation.
///
/// # Example
/// ```ignore
/// use hosting_api::db::{PostgresConfig, RepositoryBuilder, RepositoryType};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     // Requires the `postgres-repo` feature.
///     let repo = RepositoryBuilder::new()
///         .repository_type(RepositoryType::Postgres)
///         .postgres_config(PostgresConfig::from_env()?)
///         .build()
///         .await?;
///     Ok(())
/// }
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    #[cfg(feature = "postgres-repo")]
    postgres_config: Option<PostgresConfig>,
}

impl RepositoryBuilder {
    /// Defaults to the type selected by the environment.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::from_env(),
            #[cfg(feature = "postgres-repo")]
            postgres_config: None,
        }
    }

    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    #[cfg(feature = "postgres-repo")]
    pub fn postgres_config(mut self, config: PostgresConfig) -> Self {
        self.postgres_config = Some(config);
        self
    }

    /// Load the repository type and Postgres settings from the environment.
    pub fn from_env(mut self) -> RepositoryResult<Self> {
        self.repo_type = RepositoryType::from_env();

        if self.repo_type == RepositoryType::Postgres {
            #[cfg(feature = "postgres-repo")]
            {
                self.postgres_config = Some(PostgresConfig::from_env()?);
            }
            #[cfg(not(feature = "postgres-repo"))]
            {
                return Err(postgres_disabled("builder_from_env"));
            }
        }

        Ok(self)
    }

    /// Load configuration from a TOML file.
    pub fn from_config_file<P: AsRef<Path>>(self, config_path: P) -> RepositoryResult<Self> {
        let repo_config = RepositoryConfig::from_file(config_path)?;
        self.apply_config(&repo_config)
    }

    /// Load configuration from the default `repository.toml` location.
    pub fn from_default_config(self) -> RepositoryResult<Self> {
        let repo_config = RepositoryConfig::from_default_location()?;
        self.apply_config(&repo_config)
    }

    fn apply_config(mut self, repo_config: &RepositoryConfig) -> RepositoryResult<Self> {
        self.repo_type = repo_config
            .repository_type()
            .map_err(|e| invalid_type("apply_config", e))?;

        if self.repo_type == RepositoryType::Postgres {
            #[cfg(feature = "postgres-repo")]
            {
                let config = repo_config.to_postgres_config()?.ok_or_else(|| {
                    RepositoryError::configuration_with_context(
                        "Postgres repository requires database configuration",
                        ErrorContext::new("apply_config"),
                    )
                })?;
                self.postgres_config = Some(config);
            }
            #[cfg(not(feature = "postgres-repo"))]
            {
                return Err(postgres_disabled("apply_config"));
            }
        }

        Ok(self)
    }

    pub async fn build(self) -> RepositoryResult<Arc<dyn FullRepository>> {
        #[cfg(feature = "postgres-repo")]
        let pg_config = self.postgres_config.as_ref();
        #[cfg(not(feature = "postgres-repo"))]
        let pg_config = None;

        RepositoryFactory::create(self.repo_type, pg_config).await
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_type_from_str() {
        assert_eq!(
            RepositoryType::from_str("local").unwrap(),
            RepositoryType::Local
        );
        assert_eq!(
            RepositoryType::from_str(" Postgres ").unwrap(),
            RepositoryType::Postgres
        );
        assert_eq!(
            RepositoryType::from_str("Pg").unwrap(),
            RepositoryType::Postgres
        );
        assert!(RepositoryType::from_str("mysql").is_err());
    }

    #[tokio::test]
    async fn test_create_local_repository() {
        let repo = RepositoryFactory::create_local();
        assert!(repo.health_check().await.unwrap());
        assert!(repo.list_accommodations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_builder_local_repository() {
        let repo = RepositoryBuilder::new()
            .repository_type(RepositoryType::Local)
            .build()
            .await
            .unwrap();

        assert!(repo.health_check().await.unwrap());
    }

    #[cfg(not(feature = "postgres-repo"))]
    #[tokio::test]
    async fn test_postgres_without_feature_is_configuration_error() {
        let err = RepositoryFactory::create(RepositoryType::Postgres, None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    }
}
