//! In-memory book storage backend for the Bookshelf server.
//!
//! This crate provides an in-memory implementation of the `BookStore` trait
//! from `bookshelf-storage`, using papaya lock-free HashMap for concurrent
//! access. It backs the `memory` storage mode and doubles as the store used
//! by resolver tests.
//!
//! # Example
//!
//! ```ignore
//! use bookshelf_db_memory::InMemoryBookStore;
//! use bookshelf_storage::{BookStore, NewBook};
//!
//! let store = InMemoryBookStore::new();
//! let book = store.insert(NewBook::new("Dune", "Herbert", 1965)).await?;
//! assert_eq!(book.id, "1");
//! ```

pub mod storage;

pub use bookshelf_storage::{BookStore, StorageError};
pub use storage::InMemoryBookStore;

/// Creates a new shareable in-memory BookStore instance.
pub fn create_book_store() -> bookshelf_storage::DynBookStore {
    std::sync::Arc::new(InMemoryBookStore::new())
}
