//! CRUD query implementations for the `books` document table.

use serde::Deserialize;
use serde_json::Value;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use uuid::Uuid;

use bookshelf_storage::{Book, BookPatch, NewBook};

use crate::error::{PostgresError, Result};

/// The JSON body stored in `books.document`.
#[derive(Debug, Deserialize)]
struct BookDocument {
    title: String,
    author: String,
    year: i32,
}

/// Decodes an `(id, document)` row into a book.
fn row_to_book((id, document): (String, Value)) -> Result<Book> {
    let doc: BookDocument =
        serde_json::from_value(document).map_err(|e| PostgresError::MalformedDocument {
            id: id.clone(),
            message: e.to_string(),
        })?;
    Ok(Book {
        id,
        title: doc.title,
        author: doc.author,
        year: doc.year,
    })
}

/// Returns all books in insertion order.
pub async fn find_all(pool: &PgPool) -> Result<Vec<Book>> {
    let rows: Vec<(String, Value)> = query_as("SELECT id, document FROM books ORDER BY seq")
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(row_to_book).collect()
}

/// Reads a book by ID. Returns `None` if the book doesn't exist.
pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Book>> {
    let row: Option<(String, Value)> = query_as("SELECT id, document FROM books WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(row_to_book).transpose()
}

/// Inserts a new book under a freshly generated UUID.
pub async fn insert(pool: &PgPool, book: &NewBook) -> Result<Book> {
    let id = Uuid::new_v4().to_string();

    let row: (String, Value) = query_as(
        r#"INSERT INTO books (id, document)
           VALUES ($1, $2)
           RETURNING id, document"#,
    )
    .bind(&id)
    .bind(book.to_document())
    .fetch_one(pool)
    .await?;

    row_to_book(row)
}

/// Merges the supplied fields into the stored document.
///
/// Returns the post-update book, or `None` if the book doesn't exist.
pub async fn update_by_id(pool: &PgPool, id: &str, patch: &BookPatch) -> Result<Option<Book>> {
    if patch.is_empty() {
        return find_by_id(pool, id).await;
    }

    let row: Option<(String, Value)> = query_as(
        r#"UPDATE books
           SET document = document || $2, updated_at = now()
           WHERE id = $1
           RETURNING id, document"#,
    )
    .bind(id)
    .bind(patch.to_document())
    .fetch_optional(pool)
    .await?;

    row.map(row_to_book).transpose()
}

/// Hard-deletes a book. Returns `true` if a row was removed.
pub async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool> {
    let result = query("DELETE FROM books WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_to_book() {
        let book = row_to_book((
            "abc".into(),
            json!({ "title": "Dune", "author": "Herbert", "year": 1965 }),
        ))
        .unwrap();
        assert_eq!(book.id, "abc");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.year, 1965);
    }

    #[test]
    fn test_row_to_book_malformed() {
        let err = row_to_book(("abc".into(), json!({ "title": "Dune" }))).unwrap_err();
        assert!(matches!(err, PostgresError::MalformedDocument { .. }));
    }
}
