//! Tests for db::factory module - repository creation and configuration.

mod support;

use std::io::Write;
use std::str::FromStr;

use hosting_api::db::factory::{RepositoryFactory, RepositoryType};
use hosting_api::db::repository::RepositoryError;
use hosting_api::db::RepositoryConfig;

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_repository_type_from_str() {
    assert_eq!(RepositoryType::from_str("postgres").unwrap(), RepositoryType::Postgres);
    assert_eq!(RepositoryType::from_str("PG").unwrap(), RepositoryType::Postgres);
    assert_eq!(RepositoryType::from_str(" Local ").unwrap(), RepositoryType::Local);

    let err = RepositoryType::from_str("mysql").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/hosting")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres),
    );
}

#[test]
fn test_repository_type_from_env_with_pg_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", Some("postgres://localhost/hosting")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres),
    );
}

#[test]
fn test_explicit_type_beats_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/hosting")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_repository_type_from_env_invalid_defaults_to_local() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("invalid")),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[tokio::test]
async fn test_create_local_via_factory() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
    assert!(repo.list_users().await.unwrap().is_empty());
}

#[cfg(feature = "postgres-repo")]
#[tokio::test]
async fn test_create_postgres_without_config_fails() {
    let err = RepositoryFactory::create(RepositoryType::Postgres, None)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    assert!(err.to_string().contains("requires PostgresConfig"));
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_create_postgres_without_feature_fails() {
    let err = RepositoryFactory::create(RepositoryType::Postgres, None)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    assert!(err.to_string().contains("feature not enabled"));
}

#[tokio::test]
async fn test_from_config_file_local() {
    let file = config_file("[repository]\ntype = \"local\"\n");
    let repo = RepositoryFactory::from_config_file(file.path()).await.unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_from_config_file_unknown_type() {
    let file = config_file("[repository]\ntype = \"sqlite\"\n");
    let err = RepositoryFactory::from_config_file(file.path())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
}

#[tokio::test]
async fn test_from_config_file_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("repository.toml");
    let err = RepositoryFactory::from_config_file(&missing)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
}

#[test]
fn test_config_postgres_defaults() {
    let file = config_file(
        "[repository]\ntype = \"postgres\"\n\n[postgres]\ndatabase_url = \"postgres://localhost/hosting\"\n",
    );
    let config = RepositoryConfig::from_file(file.path()).unwrap();
    assert_eq!(config.repository_type().unwrap(), RepositoryType::Postgres);
    assert_eq!(config.postgres.database_url, "postgres://localhost/hosting");
    assert!(config.postgres.max_connections >= config.postgres.min_connections);
}

#[test]
fn test_unlisted_repository_keys_are_cleared() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", None)], || {
        assert!(std::env::var("DATABASE_URL").is_err());
        assert!(std::env::var("PG_DATABASE_URL").is_err());
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
    });
}

#[test]
fn test_env_lock_survives_a_panicking_test() {
    let outcome = std::panic::catch_unwind(|| {
        support::with_scoped_env(&[("REPOSITORY_TYPE", Some("postgres"))], || {
            panic!("failing test body")
        })
    });
    assert!(outcome.is_err());

    support::with_scoped_env(&[], || {
        assert!(std::env::var("REPOSITORY_TYPE").is_err());
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
    });
}
