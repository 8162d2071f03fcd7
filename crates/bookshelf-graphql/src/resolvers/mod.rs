//! GraphQL resolvers for books.
//!
//! Each resolver issues exactly one store call:
//! - `list`: `Query.books`
//! - `read`: `Query.book(id)`
//! - `create`: `Mutation.addBook`
//! - `update`: `Mutation.updateBook`
//! - `delete`: `Mutation.deleteBook`

mod create;
mod delete;
mod list;
mod read;
mod update;

pub use create::CreateResolver;
pub use delete::DeleteResolver;
pub use list::ListResolver;
pub use read::ReadResolver;
pub use update::{UpdateResolver, build_patch};

use async_graphql::dynamic::ResolverContext;
use async_graphql::indexmap::IndexMap;
use async_graphql::{Error as GraphQLError, Name, Value};
use bookshelf_storage::Book;

use crate::context::GraphQLContext;

/// Helper to extract GraphQL context from resolver context.
pub(crate) fn get_graphql_context<'a>(
    ctx: &'a ResolverContext<'_>,
) -> Result<&'a GraphQLContext, GraphQLError> {
    ctx.data::<GraphQLContext>()
        .map_err(|_| GraphQLError::new("GraphQL context not available"))
}

/// Converts a book into the object value the `Book` type's fields read from.
pub(crate) fn book_to_value(book: Book) -> Value {
    let mut map = IndexMap::new();
    map.insert(Name::new("id"), Value::String(book.id));
    map.insert(Name::new("title"), Value::String(book.title));
    map.insert(Name::new("author"), Value::String(book.author));
    map.insert(Name::new("year"), Value::Number(book.year.into()));
    Value::Object(map)
}

/// Reads the `id` argument. `ID` inputs may arrive as strings or integers.
pub(crate) fn id_arg(ctx: &ResolverContext<'_>) -> Result<String, GraphQLError> {
    let value = ctx
        .args
        .get("id")
        .ok_or_else(|| GraphQLError::new("Missing required argument 'id'"))?;

    if let Ok(s) = value.string() {
        return Ok(s.to_string());
    }
    if let Ok(i) = value.i64() {
        return Ok(i.to_string());
    }
    Err(GraphQLError::new("Argument 'id' must be an ID"))
}

/// Reads an optional string argument; an explicit `null` reads as `None`.
pub(crate) fn string_arg(
    ctx: &ResolverContext<'_>,
    name: &str,
) -> Result<Option<String>, GraphQLError> {
    match ctx.args.get(name) {
        Some(value) if !value.is_null() => Ok(Some(value.string()?.to_string())),
        _ => Ok(None),
    }
}

/// Reads an optional `Int` argument; an explicit `null` reads as `None`.
pub(crate) fn int_arg(ctx: &ResolverContext<'_>, name: &str) -> Result<Option<i32>, GraphQLError> {
    match ctx.args.get(name) {
        Some(value) if !value.is_null() => {
            let raw = value.i64()?;
            i32::try_from(raw)
                .map(Some)
                .map_err(|_| GraphQLError::new(format!("Argument '{name}' is out of range")))
        }
        _ => Ok(None),
    }
}
