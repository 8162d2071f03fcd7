//! # bookshelf-storage
//!
//! Record store abstraction layer for the Bookshelf server.
//!
//! This crate defines the traits and types that all book store backends must
//! implement. It does not contain any implementations - those are provided by
//! separate crates (`bookshelf-db-memory`, `bookshelf-db-postgres`).
//!
//! ## Overview
//!
//! The main trait is [`BookStore`], which defines the contract for:
//! - listing and reading books
//! - inserting new books (the store assigns the `id`)
//! - partial updates
//! - hard deletes
//!
//! ## Example
//!
//! ```ignore
//! use bookshelf_storage::{BookStore, NewBook, StorageError};
//!
//! async fn add_dune(store: &dyn BookStore) -> Result<String, StorageError> {
//!     let book = store.insert(NewBook::new("Dune", "Herbert", 1965)).await?;
//!     Ok(book.id)
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::BookStore;
pub use types::{Book, BookPatch, NewBook};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared book store trait object.
pub type DynBookStore = std::sync::Arc<dyn BookStore>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use bookshelf_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::BookStore;
    pub use crate::types::{Book, BookPatch, NewBook};
    pub use crate::{DynBookStore, StorageResult};
}
