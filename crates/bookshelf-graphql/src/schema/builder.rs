//! Book GraphQL schema builder.

use async_graphql::Value;
use async_graphql::dynamic::{Field, FieldFuture, InputValue, Object, Schema, TypeRef};
use tracing::debug;

use crate::error::GraphQLError;
use crate::resolvers::{
    CreateResolver, DeleteResolver, ListResolver, ReadResolver, UpdateResolver,
};

/// Name of the `Book` object type.
pub const BOOK_TYPE: &str = "Book";

/// Configuration for the schema builder.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
        }
    }
}

/// Builds the book catalogue schema.
///
/// # Example
///
/// ```ignore
/// let schema = BookSchemaBuilder::new(SchemaBuilderConfig::default()).build()?;
/// ```
pub struct BookSchemaBuilder {
    config: SchemaBuilderConfig,
}

impl BookSchemaBuilder {
    /// Creates a new schema builder.
    #[must_use]
    pub fn new(config: SchemaBuilderConfig) -> Self {
        Self { config }
    }

    /// Builds the GraphQL schema.
    ///
    /// # Errors
    ///
    /// Returns an error if schema construction fails.
    pub fn build(&self) -> Result<Schema, GraphQLError> {
        debug!("Starting GraphQL schema build");

        let mut schema_builder = Schema::build("Query", Some("Mutation"), None)
            .register(self.build_book_type())
            .register(self.build_query_type())
            .register(self.build_mutation_type())
            .limit_depth(self.config.max_depth)
            .limit_complexity(self.config.max_complexity);

        if !self.config.introspection_enabled {
            schema_builder = schema_builder.disable_introspection();
        }

        let schema = schema_builder
            .finish()
            .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))?;

        debug!("GraphQL schema build complete");
        Ok(schema)
    }

    fn build_book_type(&self) -> Object {
        Object::new(BOOK_TYPE)
            .description("A book in the catalogue")
            .field(book_field("id", TypeRef::ID))
            .field(book_field("title", TypeRef::STRING))
            .field(book_field("author", TypeRef::STRING))
            .field(book_field("year", TypeRef::INT))
    }

    fn build_query_type(&self) -> Object {
        Object::new("Query")
            .field(
                Field::new(
                    "books",
                    TypeRef::named_nn_list_nn(BOOK_TYPE),
                    ListResolver::resolve(),
                )
                .description("All books in the store's natural order"),
            )
            .field(
                Field::new("book", TypeRef::named(BOOK_TYPE), ReadResolver::resolve())
                    .description("A single book by id")
                    .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID))),
            )
    }

    fn build_mutation_type(&self) -> Object {
        Object::new("Mutation")
            .field(
                Field::new(
                    "addBook",
                    TypeRef::named_nn(BOOK_TYPE),
                    CreateResolver::resolve(),
                )
                .argument(InputValue::new("title", TypeRef::named_nn(TypeRef::STRING)))
                .argument(InputValue::new("author", TypeRef::named_nn(TypeRef::STRING)))
                .argument(InputValue::new("year", TypeRef::named_nn(TypeRef::INT))),
            )
            .field(
                Field::new(
                    "updateBook",
                    TypeRef::named(BOOK_TYPE),
                    UpdateResolver::resolve(),
                )
                .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID)))
                .argument(InputValue::new("title", TypeRef::named(TypeRef::STRING)))
                .argument(InputValue::new("author", TypeRef::named(TypeRef::STRING)))
                .argument(InputValue::new("year", TypeRef::named(TypeRef::INT))),
            )
            .field(
                Field::new(
                    "deleteBook",
                    TypeRef::named_nn(TypeRef::BOOLEAN),
                    DeleteResolver::resolve(),
                )
                .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID))),
            )
    }
}

/// A non-null `Book` field read from the parent object value.
fn book_field(name: &'static str, scalar: &'static str) -> Field {
    Field::new(name, TypeRef::named_nn(scalar), move |ctx| {
        FieldFuture::new(async move {
            if let Some(Value::Object(obj)) = ctx.parent_value.as_value() {
                if let Some(value) = obj.get(name) {
                    return Ok(Some(value.clone()));
                }
            }
            Ok(None)
        })
    })
}
