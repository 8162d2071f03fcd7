//! Record types shared by every book store backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageError;

/// A persisted book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned identifier. Never reused after deletion.
    pub id: String,
    pub title: String,
    pub author: String,
    pub year: i32,
}

/// The fields of a book that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i32,
}

impl NewBook {
    /// Creates a new unsaved book.
    #[must_use]
    pub fn new(title: impl Into<String>, author: impl Into<String>, year: i32) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year,
        }
    }

    /// Checks the schema rules every stored book must satisfy.
    ///
    /// `title` and `author` are required; an empty string does not count as
    /// present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRecord` naming the first missing field.
    pub fn validate(&self) -> Result<(), StorageError> {
        require_text("title", &self.title)?;
        require_text("author", &self.author)?;
        Ok(())
    }

    /// Attaches a store-assigned ID.
    #[must_use]
    pub fn into_book(self, id: impl Into<String>) -> Book {
        Book {
            id: id.into(),
            title: self.title,
            author: self.author,
            year: self.year,
        }
    }

    /// Returns the document body as stored by document backends.
    #[must_use]
    pub fn to_document(&self) -> Value {
        serde_json::json!({
            "title": self.title,
            "author": self.author,
            "year": self.year,
        })
    }
}

/// A partial update. `None` means "leave the stored field unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
}

impl BookPatch {
    /// Returns `true` if no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.year.is_none()
    }

    /// Checks that the supplied fields keep the book valid.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRecord` if a supplied text field is empty.
    pub fn validate(&self) -> Result<(), StorageError> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(author) = &self.author {
            require_text("author", author)?;
        }
        Ok(())
    }

    /// Returns `book` with the supplied fields replaced.
    #[must_use]
    pub fn apply_to(&self, book: &Book) -> Book {
        Book {
            id: book.id.clone(),
            title: self.title.clone().unwrap_or_else(|| book.title.clone()),
            author: self.author.clone().unwrap_or_else(|| book.author.clone()),
            year: self.year.unwrap_or(book.year),
        }
    }

    /// Returns only the supplied fields as a JSON object, suitable for a
    /// document merge.
    #[must_use]
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        if let Some(title) = &self.title {
            doc.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(author) = &self.author {
            doc.insert("author".into(), Value::String(author.clone()));
        }
        if let Some(year) = self.year {
            doc.insert("year".into(), Value::from(year));
        }
        Value::Object(doc)
    }
}

fn require_text(field: &str, value: &str) -> Result<(), StorageError> {
    if value.is_empty() {
        return Err(StorageError::invalid_record(format!(
            "Path `{field}` is required"
        )));
    }
    Ok(())
}
