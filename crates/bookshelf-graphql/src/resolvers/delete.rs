//! Delete mutation resolver.

use async_graphql::Value;
use async_graphql::dynamic::{FieldFuture, ResolverContext};
use tracing::{debug, warn};

use super::{get_graphql_context, id_arg};
use crate::error::{BookError, storage_error_to_graphql};

/// Resolver for `Mutation.deleteBook(id: ID!)`.
///
/// Returns `true` when a book was removed and `false` when nothing matched.
pub struct DeleteResolver;

impl DeleteResolver {
    pub fn resolve() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            FieldFuture::new(async move {
                let id = id_arg(&ctx)?;
                let gql_ctx = get_graphql_context(&ctx)?;

                let deleted = gql_ctx.store.delete_by_id(&id).await.map_err(|e| {
                    warn!(
                        error = %e,
                        id = %id,
                        request_id = %gql_ctx.request_id,
                        "Failed to delete book"
                    );
                    storage_error_to_graphql(BookError::delete(&e), &e)
                })?;

                debug!(id = %id, deleted, "Delete processed");
                Ok(Some(Value::Boolean(deleted)))
            })
        }
    }
}
