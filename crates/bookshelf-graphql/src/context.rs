//! GraphQL execution context.
//!
//! The context is built per request from shared state (the book store and
//! resolver options) plus request-specific state (the request id), and is
//! handed to resolvers through async-graphql's context data.
//!
//! # Example
//!
//! ```ignore
//! use bookshelf_graphql::GraphQLContextBuilder;
//!
//! let context = GraphQLContextBuilder::new()
//!     .with_store(store.clone())
//!     .with_options(config.resolver_options())
//!     .with_request_id("req-123")
//!     .build()?;
//! ```

use bookshelf_storage::DynBookStore;

use crate::config::ResolverOptions;

/// GraphQL execution context.
#[derive(Clone)]
pub struct GraphQLContext {
    /// Book storage.
    pub store: DynBookStore,

    /// Resolver behaviour switches.
    pub options: ResolverOptions,

    /// Request ID for tracing and correlation.
    pub request_id: String,
}

impl GraphQLContext {
    /// Creates a new builder for GraphQLContext.
    #[must_use]
    pub fn builder() -> GraphQLContextBuilder {
        GraphQLContextBuilder::default()
    }
}

impl std::fmt::Debug for GraphQLContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLContext")
            .field("store", &self.store.backend_name())
            .field("options", &self.options)
            .field("request_id", &self.request_id)
            .finish()
    }
}

/// Builder for constructing GraphQLContext.
#[derive(Default)]
pub struct GraphQLContextBuilder {
    store: Option<DynBookStore>,
    options: Option<ResolverOptions>,
    request_id: Option<String>,
}

impl GraphQLContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the book store.
    #[must_use]
    pub fn with_store(mut self, store: DynBookStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the resolver options. Defaults apply when unset.
    #[must_use]
    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Builds the GraphQLContext.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is missing.
    pub fn build(self) -> Result<GraphQLContext, ContextBuilderError> {
        let store = self
            .store
            .ok_or(ContextBuilderError::MissingField("store"))?;

        Ok(GraphQLContext {
            store,
            options: self.options.unwrap_or_default(),
            request_id: self.request_id.unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

/// Errors that can occur when building a GraphQLContext.
#[derive(Debug, thiserror::Error)]
pub enum ContextBuilderError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
