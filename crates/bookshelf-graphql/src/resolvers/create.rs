//! Create mutation resolver.

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use bookshelf_storage::NewBook;
use tracing::{debug, warn};

use super::{book_to_value, get_graphql_context, int_arg, string_arg};
use crate::error::{BookError, storage_error_to_graphql};

/// Resolver for `Mutation.addBook(title, author, year)`.
///
/// The store assigns the id and enforces the required fields; a rejected
/// record surfaces as `CREATE_ERROR`.
pub struct CreateResolver;

impl CreateResolver {
    pub fn resolve() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;

                let title = string_arg(&ctx, "title")?.unwrap_or_default();
                let author = string_arg(&ctx, "author")?.unwrap_or_default();
                let year = int_arg(&ctx, "year")?
                    .ok_or_else(|| async_graphql::Error::new("Missing required argument 'year'"))?;

                let book = gql_ctx
                    .store
                    .insert(NewBook::new(title, author, year))
                    .await
                    .map_err(|e| {
                        warn!(
                            error = %e,
                            request_id = %gql_ctx.request_id,
                            "Failed to create book"
                        );
                        storage_error_to_graphql(BookError::create(&e), &e)
                    })?;

                debug!(id = %book.id, "Book created");
                Ok(Some(book_to_value(book)))
            })
        }
    }
}
