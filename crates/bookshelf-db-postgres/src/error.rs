//! Error types for the PostgreSQL storage backend.

use bookshelf_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// PostgreSQL error code for a CHECK constraint violation (23514).
pub const PG_CHECK_VIOLATION: &str = "23514";

/// PostgreSQL error code for a NOT NULL violation (23502).
pub const PG_NOT_NULL_VIOLATION: &str = "23502";

/// Checks if a sqlx error has a specific PostgreSQL error code.
pub fn has_pg_error_code(err: &SqlxError, code: &str) -> bool {
    if let SqlxError::Database(db_err) = err {
        db_err.code().as_deref() == Some(code)
    } else {
        false
    }
}

/// Returns `true` for errors raised before a query ever reached the server.
pub fn is_connection_failure(err: &SqlxError) -> bool {
    matches!(
        err,
        SqlxError::Io(_) | SqlxError::Tls(_) | SqlxError::PoolTimedOut | SqlxError::PoolClosed
    )
}

/// Errors specific to the PostgreSQL storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    /// Migration error (generic string for compatibility with different migration tools).
    #[error("Migration error: {0}")]
    Migration(String),

    /// Stored document could not be decoded into a book.
    #[error("Malformed document for book {id}: {message}")]
    MalformedDocument { id: String, message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Database(e) => {
                if has_pg_error_code(&e, PG_CHECK_VIOLATION)
                    || has_pg_error_code(&e, PG_NOT_NULL_VIOLATION)
                {
                    StorageError::invalid_record(constraint_message(&e))
                } else if is_connection_failure(&e) {
                    StorageError::connection_error(e.to_string())
                } else {
                    StorageError::internal(e.to_string())
                }
            }
            PostgresError::Migration(e) => StorageError::internal(format!("Migration error: {e}")),
            e @ PostgresError::MalformedDocument { .. } => StorageError::internal(e.to_string()),
            PostgresError::Config { message } => {
                StorageError::internal(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Translates a violated `books_<field>_required` constraint into the
/// store's validation message.
fn constraint_message(err: &SqlxError) -> String {
    let constraint = match err {
        SqlxError::Database(db_err) => db_err.constraint().map(str::to_owned),
        _ => None,
    };
    match constraint.as_deref().and_then(|c| {
        c.strip_prefix("books_")
            .and_then(|rest| rest.strip_suffix("_required"))
    }) {
        Some(field) => format!("Path `{field}` is required"),
        None => err.to_string(),
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostgresError::config("invalid URL");
        assert!(err.to_string().contains("Configuration error"));

        let err = PostgresError::MalformedDocument {
            id: "abc".into(),
            message: "missing field `title`".into(),
        };
        assert!(err.to_string().contains("book abc"));
    }

    #[test]
    fn test_conversion_to_storage_error() {
        let storage_err: StorageError = PostgresError::config("test error").into();
        assert!(matches!(storage_err, StorageError::Internal { .. }));

        let storage_err: StorageError = PostgresError::Database(SqlxError::PoolTimedOut).into();
        assert!(storage_err.is_connection_error());

        let storage_err: StorageError = PostgresError::Database(SqlxError::RowNotFound).into();
        assert!(matches!(storage_err, StorageError::Internal { .. }));
    }
}
