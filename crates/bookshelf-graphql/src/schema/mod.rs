//! GraphQL schema building.
//!
//! The schema is assembled at startup with async-graphql's dynamic API:
//!
//! ```graphql
//! type Book { id: ID!  title: String!  author: String!  year: Int! }
//! type Query { books: [Book!]!  book(id: ID!): Book }
//! type Mutation {
//!   addBook(title: String!, author: String!, year: Int!): Book!
//!   updateBook(id: ID!, title: String, author: String, year: Int): Book
//!   deleteBook(id: ID!): Boolean!
//! }
//! ```

mod builder;

pub use builder::{BOOK_TYPE, BookSchemaBuilder, SchemaBuilderConfig};
