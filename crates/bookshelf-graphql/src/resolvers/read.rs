//! Single book read resolver.

use async_graphql::ErrorExtensions;
use async_graphql::dynamic::{FieldFuture, ResolverContext};
use tracing::{debug, warn};

use super::{book_to_value, get_graphql_context, id_arg};
use crate::error::{BookError, storage_error_to_graphql};

/// Resolver for `Query.book(id: ID!)`.
///
/// A missing book is reported as a `FETCH_ERROR` when
/// `not_found_as_error` is set, and as `null` otherwise.
pub struct ReadResolver;

impl ReadResolver {
    pub fn resolve() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            FieldFuture::new(async move {
                let id = id_arg(&ctx)?;
                let gql_ctx = get_graphql_context(&ctx)?;

                debug!(id = %id, "Resolving single book read");

                let found = gql_ctx.store.find_by_id(&id).await.map_err(|e| {
                    warn!(
                        error = %e,
                        id = %id,
                        request_id = %gql_ctx.request_id,
                        "Failed to read book"
                    );
                    storage_error_to_graphql(BookError::fetch(&e), &e)
                })?;

                match found {
                    Some(book) => Ok(Some(book_to_value(book))),
                    None if gql_ctx.options.not_found_as_error => {
                        let err = BookError::NotFound { id }.into_fetch();
                        warn!(
                            error = %err,
                            request_id = %gql_ctx.request_id,
                            "Book lookup missed"
                        );
                        Err(err.extend())
                    }
                    None => {
                        debug!(id = %id, "Book not found");
                        Ok(None)
                    }
                }
            })
        }
    }
}
