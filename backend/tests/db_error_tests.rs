//! Tests for db::repository::error module.

use hosting_api::api::{BookingId, UserId};
use hosting_api::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

#[test]
fn test_error_context_new() {
    let ctx = ErrorContext::new("create_booking");
    assert_eq!(ctx.operation, Some("create_booking".to_string()));
    assert!(ctx.entity.is_none());
    assert!(ctx.entity_id.is_none());
    assert!(ctx.details.is_none());
    assert!(!ctx.retryable);
}

#[test]
fn test_error_context_chaining() {
    let ctx = ErrorContext::new("update_booking")
        .with_entity("booking")
        .with_entity_id(BookingId(42))
        .with_details("check_out before check_in")
        .retryable();

    assert_eq!(ctx.operation, Some("update_booking".to_string()));
    assert_eq!(ctx.entity, Some("booking".to_string()));
    assert_eq!(ctx.entity_id, Some("42".to_string()));
    assert_eq!(ctx.details, Some("check_out before check_in".to_string()));
    assert!(ctx.retryable);
}

#[test]
fn test_error_context_display() {
    let ctx = ErrorContext::new("get_accommodation")
        .with_entity("accommodation")
        .with_entity_id("VUT-01")
        .with_details("field=register_number");

    let display = format!("{}", ctx);
    assert!(display.contains("operation=get_accommodation"));
    assert!(display.contains("entity=accommodation"));
    assert!(display.contains("id=VUT-01"));
    assert!(display.contains("details=field=register_number"));
    assert!(!display.contains("retryable"));
}

#[test]
fn test_error_context_default() {
    let ctx = ErrorContext::default();
    assert!(ctx.operation.is_none());
    assert!(!ctx.retryable);
    assert_eq!(format!("{}", ctx), "[]");
}

#[test]
fn test_variant_display_prefixes() {
    let cases = [
        (RepositoryError::query("bad column"), "Query error"),
        (RepositoryError::not_found("no such user"), "Not found"),
        (RepositoryError::validation("stars out of range"), "validation error"),
        (RepositoryError::conflict("email taken"), "Conflict"),
        (RepositoryError::configuration("missing url"), "Configuration error"),
        (RepositoryError::internal("poisoned"), "Internal error"),
        (RepositoryError::transaction("commit failed"), "Transaction error"),
    ];
    for (err, prefix) in cases {
        assert!(
            err.to_string().contains(prefix),
            "'{}' should contain '{}'",
            err,
            prefix
        );
    }
}

#[test]
fn test_connection_errors_are_retryable() {
    let err = RepositoryError::connection("pool exhausted");
    assert!(err.is_retryable());

    let err = RepositoryError::connection_with_context("refused", ErrorContext::new("connect"));
    assert!(err.is_retryable());
    assert!(err.to_string().contains("operation=connect"));
}

#[test]
fn test_other_errors_are_not_retryable() {
    assert!(!RepositoryError::not_found("missing").is_retryable());
    assert!(!RepositoryError::validation("invalid").is_retryable());
    assert!(!RepositoryError::conflict("overlap").is_retryable());
}

#[test]
fn test_missing_fills_context() {
    let err = RepositoryError::missing("get_user", "user", UserId(7));
    assert!(err.is_not_found());
    assert_eq!(err.message(), "user 7 not found");
    assert_eq!(err.context().operation.as_deref(), Some("get_user"));
    assert_eq!(err.context().entity.as_deref(), Some("user"));
    assert_eq!(err.context().entity_id.as_deref(), Some("7"));
}

#[test]
fn test_conflict_on_keeps_message() {
    let err = RepositoryError::conflict_on(
        "create_booking",
        "accommodation",
        "VUT-01",
        "dates overlap booking 3",
    );
    assert!(matches!(err, RepositoryError::Conflict { .. }));
    assert_eq!(err.message(), "dates overlap booking 3");
    assert_eq!(err.context().entity_id.as_deref(), Some("VUT-01"));
}

#[test]
fn test_with_operation_overrides() {
    let err = RepositoryError::missing("get_user", "user", 1).with_operation("delete_user");
    assert!(err.to_string().contains("operation=delete_user"));
    assert!(err.is_not_found());
}

#[test]
fn test_from_string() {
    let err: RepositoryError = "boom".into();
    assert!(matches!(err, RepositoryError::InternalError { .. }));
    assert_eq!(err.message(), "boom");
}

#[test]
fn test_repository_result_alias() {
    let ok: RepositoryResult<u64> = Ok(3);
    assert_eq!(ok.unwrap(), 3);
    let err: RepositoryResult<u64> = Err(RepositoryError::not_found("test"));
    assert!(err.unwrap_err().is_not_found());
}
