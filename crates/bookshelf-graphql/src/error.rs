//! Error types for GraphQL operations.
//!
//! Two layers live here:
//! - [`GraphQLError`] covers transport-level failures that never reach a
//!   resolver (bad request bodies, schema build failures) and maps to an
//!   HTTP status.
//! - [`BookError`] is the resolver taxonomy. Each variant wraps the
//!   underlying store message with an operation prefix and carries a
//!   machine-readable `code` in the GraphQL error extensions.

use std::fmt;

use async_graphql::ErrorExtensions;
use bookshelf_storage::StorageError;

/// Code reported for errors that carry no structured code.
pub const DEFAULT_ERROR_CODE: &str = "INTERNAL_SERVER_ERROR";

/// Errors that can occur outside of resolver execution.
#[derive(Debug)]
pub enum GraphQLError {
    /// Schema build failed.
    SchemaBuildFailed(String),

    /// Malformed transport request (missing query, invalid variables).
    InvalidQuery(String),

    /// Internal server error.
    Internal(String),
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaBuildFailed(msg) => {
                write!(f, "Failed to build GraphQL schema: {msg}")
            }
            Self::InvalidQuery(msg) => {
                write!(f, "Invalid GraphQL request: {msg}")
            }
            Self::Internal(msg) => {
                write!(f, "Internal error: {msg}")
            }
        }
    }
}

impl std::error::Error for GraphQLError {}

impl GraphQLError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidQuery(_) => 400,
            Self::SchemaBuildFailed(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for GraphQL error responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::InvalidQuery(_) => "BAD_REQUEST",
            Self::Internal(_) => DEFAULT_ERROR_CODE,
        }
    }
}

/// Resolver-level failures surfaced to clients.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("Error fetching books: {0}")]
    Fetch(String),

    #[error("Book not found: {id}")]
    NotFound { id: String },

    #[error("Error creating book: {0}")]
    Create(String),

    #[error("Error updating book: {0}")]
    Update(String),

    #[error("Error deleting book: {0}")]
    Delete(String),
}

impl BookError {
    /// Wraps a store failure from a read path.
    pub fn fetch(err: &StorageError) -> Self {
        Self::Fetch(err.to_string())
    }

    pub fn create(err: &StorageError) -> Self {
        Self::Create(err.to_string())
    }

    pub fn update(err: &StorageError) -> Self {
        Self::Update(err.to_string())
    }

    pub fn delete(err: &StorageError) -> Self {
        Self::Delete(err.to_string())
    }

    /// Folds a lookup miss into the fetch error a single-book query reports.
    #[must_use]
    pub fn into_fetch(self) -> Self {
        match self {
            Self::Fetch(_) => self,
            other => Self::Fetch(other.to_string()),
        }
    }

    /// Returns the code placed in `extensions.code`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "FETCH_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Create(_) => "CREATE_ERROR",
            Self::Update(_) => "UPDATE_ERROR",
            Self::Delete(_) => "DELETE_ERROR",
        }
    }
}

impl ErrorExtensions for BookError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

/// Same as [`ErrorExtensions::extend`], additionally tagging the store
/// error category.
pub(crate) fn storage_error_to_graphql(
    error: BookError,
    source: &StorageError,
) -> async_graphql::Error {
    let category = source.category().to_string();
    error
        .extend()
        .extend_with(|_, e| e.set("category", category.as_str()))
}
