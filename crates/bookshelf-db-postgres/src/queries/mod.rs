//! SQL query modules for the PostgreSQL storage backend.

pub mod crud;
