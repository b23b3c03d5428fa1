//! Error types for repository operations.
//!
//! Every variant carries an [`ErrorContext`] describing the failed operation,
//! so handlers and logs can report which entity was involved.

use std::fmt;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Structured context for repository errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "create_booking", "attach_image")
    pub operation: Option<String>,
    /// The entity type involved (e.g., "user", "accommodation", "booking")
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Connection pool or database connection errors. Usually transient.
    #[error("Connection error: {message} {context}")]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    #[error("Query error: {message} {context}")]
    QueryError {
        message: String,
        context: ErrorContext,
    },

    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Input rejected before reaching storage.
    #[error("Data validation error: {message} {context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    /// A uniqueness or referential constraint would be violated.
    #[error("Conflict: {message} {context}")]
    Conflict {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    #[error("Internal error: {message} {context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },

    /// Commit or rollback failed.
    #[error("Transaction error: {message} {context}")]
    TransactionError {
        message: String,
        context: ErrorContext,
    },
}

/// Generates the `name(message)` / `name_with_context(message, context)`
/// constructor pair for one variant.
macro_rules! constructors {
    ($($variant:ident => $plain:ident, $with_context:ident;)*) => {
        $(
            pub fn $plain(message: impl Into<String>) -> Self {
                Self::$variant {
                    message: message.into(),
                    context: ErrorContext::default(),
                }
            }

            pub fn $with_context(message: impl Into<String>, context: ErrorContext) -> Self {
                Self::$variant {
                    message: message.into(),
                    context,
                }
            }
        )*
    };
}

impl RepositoryError {
    constructors! {
        QueryError => query, query_with_context;
        NotFound => not_found, not_found_with_context;
        ValidationError => validation, validation_with_context;
        Conflict => conflict, conflict_with_context;
        ConfigurationError => configuration, configuration_with_context;
        InternalError => internal, internal_with_context;
        TransactionError => transaction, transaction_with_context;
    }

    /// Connection errors are always marked retryable.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    pub fn connection_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// `NotFound` for a missing entity, with operation, entity and id filled in.
    pub fn missing(operation: &str, entity: &str, id: impl ToString) -> Self {
        let id = id.to_string();
        Self::NotFound {
            message: format!("{} {} not found", entity, id),
            context: ErrorContext::new(operation)
                .with_entity(entity)
                .with_entity_id(id),
        }
    }

    pub fn conflict_on(
        operation: &str,
        entity: &str,
        id: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            message: message.into(),
            context: ErrorContext::new(operation)
                .with_entity(entity)
                .with_entity_id(id),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The bare message without the context suffix.
    pub fn message(&self) -> &str {
        match self {
            Self::ConnectionError { message, .. }
            | Self::QueryError { message, .. }
            | Self::NotFound { message, .. }
            | Self::ValidationError { message, .. }
            | Self::Conflict { message, .. }
            | Self::ConfigurationError { message, .. }
            | Self::InternalError { message, .. }
            | Self::TransactionError { message, .. } => message,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::Conflict { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. }
            | Self::TransactionError { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::Conflict { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. }
            | Self::TransactionError { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }
}

impl From<String> for RepositoryError {
    fn from(s: String) -> Self {
        RepositoryError::internal(s)
    }
}

impl From<&str> for RepositoryError {
    fn from(s: &str) -> Self {
        RepositoryError::internal(s.to_string())
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::DatabaseErrorKind;

        match err {
            diesel::result::Error::NotFound => RepositoryError::not_found("Record not found"),
            diesel::result::Error::DatabaseError(kind, info) => {
                let message = info.message().to_string();
                let mut context =
                    ErrorContext::default().with_details(format!("db_error_kind={:?}", kind));
                if let Some(constraint) = info.constraint_name() {
                    context = context.with_entity(constraint);
                }

                match kind {
                    DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation => {
                        RepositoryError::Conflict { message, context }
                    }
                    DatabaseErrorKind::SerializationFailure => RepositoryError::QueryError {
                        message,
                        context: context.retryable(),
                    },
                    _ => RepositoryError::QueryError { message, context },
                }
            }
            diesel::result::Error::QueryBuilderError(e) => {
                RepositoryError::query(format!("Query builder error: {}", e))
            }
            diesel::result::Error::DeserializationError(e) => {
                RepositoryError::internal(format!("Deserialization error: {}", e))
            }
            diesel::result::Error::SerializationError(e) => {
                RepositoryError::internal(format!("Serialization error: {}", e))
            }
            other => RepositoryError::query(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepositoryError::connection_with_context(
            err.to_string(),
            ErrorContext::default().with_details("pool_error"),
        )
    }
}
