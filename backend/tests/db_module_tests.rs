//! Tests for database module exports and the global repository.

mod support;

use std::sync::Arc;

use hosting_api::db;

#[test]
fn test_db_module_has_service_functions() {
    // Compile-time check that the service layer accepts both concrete and
    // dynamic repositories.
    let _: fn() = || {
        let _ = db::services::health_check::<db::LocalRepository>;
        let _ = db::services::register_user::<db::LocalRepository>;
        let _ = db::services::search_accommodations::<dyn db::FullRepository>;
        let _ = db::services::create_booking::<dyn db::FullRepository>;
    };
}

#[cfg(feature = "postgres-repo")]
#[test]
fn test_postgres_types_are_exported() {
    use hosting_api::db::{PoolStats, PostgresConfig, PostgresRepository};

    let _: Option<PostgresConfig> = None;
    let _: Option<PoolStats> = None;
    let _: Option<PostgresRepository> = None;
}

#[cfg(not(feature = "postgres-repo"))]
#[test]
fn test_postgres_fallback_types_exist() {
    use hosting_api::db::{PoolStats, PostgresConfig};

    let _: Option<PostgresConfig> = None;
    let stats = PoolStats::default();
    let _ = format!("{:?}", stats);
}

#[test]
fn test_global_repository_initializes_once() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert!(db::get_repository().is_err());

            let runtime = tokio::runtime::Runtime::new().unwrap();
            let first = runtime.block_on(db::init_repository()).unwrap();
            let second = runtime.block_on(db::init_repository()).unwrap();
            assert!(Arc::ptr_eq(first, second));
            assert!(Arc::ptr_eq(first, db::get_repository().unwrap()));

            let healthy = runtime
                .block_on(db::services::health_check(first.as_ref()))
                .unwrap();
            assert!(healthy);
        },
    );
}
