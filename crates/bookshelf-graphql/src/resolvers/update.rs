//! Update mutation resolver.

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use bookshelf_storage::BookPatch;
use tracing::{debug, trace, warn};

use super::{book_to_value, get_graphql_context, id_arg, int_arg, string_arg};
use crate::config::UpdatePolicy;
use crate::error::{BookError, storage_error_to_graphql};

/// Resolver for `Mutation.updateBook(id, title?, author?, year?)`.
///
/// Only supplied fields change. Returns the updated book, or `null` if no
/// book has the given id.
pub struct UpdateResolver;

impl UpdateResolver {
    pub fn resolve() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            FieldFuture::new(async move {
                let id = id_arg(&ctx)?;
                let gql_ctx = get_graphql_context(&ctx)?;

                let patch = build_patch(
                    string_arg(&ctx, "title")?,
                    string_arg(&ctx, "author")?,
                    int_arg(&ctx, "year")?,
                    gql_ctx.options.update_policy,
                );
                trace!(id = %id, ?patch, "Applying book patch");

                let updated = gql_ctx
                    .store
                    .update_by_id(&id, patch)
                    .await
                    .map_err(|e| {
                        warn!(
                            error = %e,
                            id = %id,
                            request_id = %gql_ctx.request_id,
                            "Failed to update book"
                        );
                        storage_error_to_graphql(BookError::update(&e), &e)
                    })?;

                match updated {
                    Some(book) => {
                        debug!(id = %book.id, "Book updated");
                        Ok(Some(book_to_value(book)))
                    }
                    None => {
                        debug!(id = %id, "No book to update");
                        Ok(None)
                    }
                }
            })
        }
    }
}

/// Turns the mutation arguments into a patch according to `policy`.
///
/// Under [`UpdatePolicy::Truthy`] an empty string or `0` is dropped as if it
/// had not been sent.
#[must_use]
pub fn build_patch(
    title: Option<String>,
    author: Option<String>,
    year: Option<i32>,
    policy: UpdatePolicy,
) -> BookPatch {
    match policy {
        UpdatePolicy::Explicit => BookPatch {
            title,
            author,
            year,
        },
        UpdatePolicy::Truthy => BookPatch {
            title: title.filter(|t| !t.is_empty()),
            author: author.filter(|a| !a.is_empty()),
            year: year.filter(|y| *y != 0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_drops_falsy_values() {
        let patch = build_patch(
            Some(String::new()),
            Some("Frank Herbert".into()),
            Some(0),
            UpdatePolicy::Truthy,
        );
        assert_eq!(patch.title, None);
        assert_eq!(patch.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(patch.year, None);
    }

    #[test]
    fn test_truthy_keeps_negative_year() {
        let patch = build_patch(None, None, Some(-500), UpdatePolicy::Truthy);
        assert_eq!(patch.year, Some(-500));
    }

    #[test]
    fn test_explicit_applies_falsy_values() {
        let patch = build_patch(Some(String::new()), None, Some(0), UpdatePolicy::Explicit);
        assert_eq!(patch.title.as_deref(), Some(""));
        assert_eq!(patch.author, None);
        assert_eq!(patch.year, Some(0));
    }

    #[test]
    fn test_nothing_supplied_is_empty() {
        assert!(build_patch(None, None, None, UpdatePolicy::Truthy).is_empty());
        assert!(build_patch(None, None, None, UpdatePolicy::Explicit).is_empty());
    }
}
