//! Book list resolver.

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use tracing::{debug, warn};

use super::{book_to_value, get_graphql_context};
use crate::error::{BookError, storage_error_to_graphql};

/// Resolver for `Query.books`.
///
/// Returns every book in the store's natural order; an empty store yields an
/// empty list.
pub struct ListResolver;

impl ListResolver {
    pub fn resolve() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;

                let books = gql_ctx.store.find_all().await.map_err(|e| {
                    warn!(
                        error = %e,
                        request_id = %gql_ctx.request_id,
                        "Failed to list books"
                    );
                    storage_error_to_graphql(BookError::fetch(&e), &e)
                })?;

                debug!(count = books.len(), "Resolved book list");

                Ok(Some(FieldValue::list(
                    books
                        .into_iter()
                        .map(|book| FieldValue::value(book_to_value(book))),
                )))
            })
        }
    }
}
