use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bookshelf_storage::{Book, BookPatch, BookStore, NewBook, StorageError};
use papaya::HashMap as PapayaHashMap;
use tracing::debug;

/// In-memory book store using papaya lock-free HashMap.
///
/// IDs are decimal strings drawn from a monotonically increasing counter
/// starting at 1, so an ID is never handed out twice even after deletion.
/// Books are listed in insertion order.
#[derive(Debug)]
pub struct InMemoryBookStore {
    /// Books keyed by their numeric sequence.
    data: PapayaHashMap<u64, Book>,
    /// Next sequence to assign.
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Default for InMemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBookStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            data: PapayaHashMap::new(),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a store pre-populated with the two sample books.
    pub fn with_sample_data() -> Self {
        let store = Self::new();
        for book in [
            NewBook::new("The Great Gatsby", "F. Scott Fitzgerald", 1925),
            NewBook::new("To Kill a Mockingbird", "Harper Lee", 1960),
        ] {
            store.insert_sync(book);
        }
        store
    }

    /// Returns the number of stored books.
    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    /// Returns `true` if the store holds no books.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn insert_sync(&self, book: NewBook) -> Book {
        let seq = self.next_id.fetch_add(1, Ordering::SeqCst);
        let book = book.into_book(seq.to_string());
        self.data.pin().insert(seq, book.clone());
        book
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.is_closed() {
            return Err(StorageError::connection_error("store is closed"));
        }
        Ok(())
    }
}

/// Parses a book ID back into its sequence. Foreign IDs never match.
///
/// Only the canonical rendering is accepted, so `"01"` or `"+1"` do not
/// alias the book with id `"1"`.
fn parse_id(id: &str) -> Option<u64> {
    id.parse().ok().filter(|seq: &u64| seq.to_string() == id)
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn find_all(&self) -> Result<Vec<Book>, StorageError> {
        self.ensure_open()?;
        let guard = self.data.pin();
        let mut entries: Vec<(u64, Book)> = guard
            .iter()
            .map(|(seq, book)| (*seq, book.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, book)| book).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, StorageError> {
        self.ensure_open()?;
        let Some(seq) = parse_id(id) else {
            return Ok(None);
        };
        Ok(self.data.pin().get(&seq).cloned())
    }

    async fn insert(&self, book: NewBook) -> Result<Book, StorageError> {
        self.ensure_open()?;
        book.validate()?;
        let book = self.insert_sync(book);
        debug!(id = %book.id, "book inserted");
        Ok(book)
    }

    async fn update_by_id(
        &self,
        id: &str,
        patch: BookPatch,
    ) -> Result<Option<Book>, StorageError> {
        self.ensure_open()?;
        patch.validate()?;
        let Some(seq) = parse_id(id) else {
            return Ok(None);
        };
        let guard = self.data.pin();
        Ok(guard.update(seq, |book| patch.apply_to(book)).cloned())
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, StorageError> {
        self.ensure_open()?;
        let Some(seq) = parse_id(id) else {
            return Ok(false);
        };
        Ok(self.data.pin().remove(&seq).is_some())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
