//! Storage traits for the record store abstraction layer.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{Book, BookPatch, NewBook};

/// The record store contract that all book backends must implement.
///
/// Each method maps to exactly one backend operation. Implementations must be
/// thread-safe (`Send + Sync`) and serialize conflicting writes themselves.
///
/// # Example
///
/// ```ignore
/// use bookshelf_storage::{BookStore, StorageError};
///
/// async fn title_of(store: &dyn BookStore, id: &str) -> Result<Option<String>, StorageError> {
///     Ok(store.find_by_id(id).await?.map(|book| book.title))
/// }
/// ```
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Returns every book in the store's natural retrieval order.
    ///
    /// The order is backend-defined and not a sorting contract.
    async fn find_all(&self) -> Result<Vec<Book>, StorageError>;

    /// Reads a book by ID.
    ///
    /// Returns `None` if no book has this ID.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing books.
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, StorageError>;

    /// Persists a new book and returns it with its store-assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRecord` if a required field is empty.
    async fn insert(&self, book: NewBook) -> Result<Book, StorageError>;

    /// Applies the fields present in `patch` to the book with this ID.
    ///
    /// Returns the post-update state, or `None` if no book has this ID.
    /// An empty patch leaves the book unchanged and returns its current state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRecord` if the patch would empty a
    /// required field.
    async fn update_by_id(&self, id: &str, patch: BookPatch)
    -> Result<Option<Book>, StorageError>;

    /// Removes the book with this ID.
    ///
    /// Returns `true` iff a book existed and was removed.
    async fn delete_by_id(&self, id: &str) -> Result<bool, StorageError>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Releases backend connections. Called once during shutdown.
    async fn close(&self) -> Result<(), StorageError>;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
