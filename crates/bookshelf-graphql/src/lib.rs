//! # bookshelf-graphql
//!
//! GraphQL API layer for the Bookshelf server.
//!
//! The schema exposes a `Book` type with list/read queries and
//! add/update/delete mutations. Every resolver maps to exactly one
//! [`BookStore`](bookshelf_storage::BookStore) call and reports failures as
//! GraphQL errors carrying an operation-specific `code`
//! (`FETCH_ERROR`, `CREATE_ERROR`, `UPDATE_ERROR`, `DELETE_ERROR`).
//!
//! ## Endpoints
//!
//! - `POST /graphql` - GraphQL over JSON
//! - `GET /graphql` - GraphQL via URL params, or GraphiQL without a query
//!
//! ## Configuration
//!
//! Add to `bookshelf.toml`:
//!
//! ```toml
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! playground = true
//! update_policy = "truthy"
//! not_found_as_error = true
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod resolvers;
pub mod schema;

// Re-export main types
pub use config::{GraphQLConfig, ResolverOptions, UpdatePolicy};
pub use context::{GraphQLContext, GraphQLContextBuilder};
pub use error::{BookError, GraphQLError};
pub use handler::{GRAPHQL_PATH, GraphQLState, graphql_handler, graphql_handler_get};
pub use schema::{BookSchemaBuilder, SchemaBuilderConfig};

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
