//! PostgreSQL implementation of the BookStore trait.

use async_trait::async_trait;
use sqlx_postgres::PgPool;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use bookshelf_storage::{Book, BookPatch, BookStore, NewBook, StorageError};

use crate::config::PostgresConfig;
use crate::error::PostgresError;
use crate::migrations;
use crate::pool;
use crate::queries::crud;

/// PostgreSQL storage backend for books.
///
/// Books live as JSONB documents in the `books` table. When migrations are
/// enabled but could not run at startup (lenient mode with the database
/// down), they are retried before the first query that finds the database
/// reachable.
#[derive(Debug)]
pub struct PostgresBookStore {
    pool: PgPool,
    run_migrations: bool,
    schema_ready: OnceCell<()>,
}

impl PostgresBookStore {
    /// Creates a new `PostgresBookStore` with the given configuration.
    ///
    /// With `fail_fast` the pool must connect (after retries) and migrations
    /// must succeed. Without it, connection and migration failures are
    /// logged and the store starts anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created
    /// or if migrations fail (fail-fast mode), or if the URL is malformed.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let store = if config.fail_fast {
            let pool = pool::connect_with_retry(&config).await.map_err(|e| {
                error!(error = %e, "PostgreSQL connection failed, giving up");
                StorageError::from(e)
            })?;
            Self::from_pool(pool, config.run_migrations)
        } else {
            let pool = pool::create_lazy_pool(&config)?;
            let store = Self::from_pool(pool, config.run_migrations);
            if let Err(e) = pool::test_connection(&store.pool).await {
                error!(
                    error = %e,
                    "PostgreSQL connection error; starting anyway, requests will fail until the database is reachable"
                );
                return Ok(store);
            }
            info!("Connected to PostgreSQL");
            store
        };

        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates a new `PostgresBookStore` from an existing connection pool.
    ///
    /// Migrations, when enabled, run before the first query.
    #[must_use]
    pub fn from_pool(pool: PgPool, run_migrations: bool) -> Self {
        Self {
            pool,
            run_migrations,
            schema_ready: OnceCell::new(),
        }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        if !self.run_migrations {
            return Ok(());
        }
        self.schema_ready
            .get_or_try_init(|| async {
                // An unreachable database is a connection failure, not a migration one.
                pool::test_connection(&self.pool)
                    .await
                    .map_err(storage_error)?;
                migrations::run(&self.pool).await.map_err(|e| {
                    warn!(error = %e, "Database migrations failed");
                    StorageError::from(e)
                })
            })
            .await?;
        Ok(())
    }
}

fn storage_error(err: PostgresError) -> StorageError {
    StorageError::from(err)
}

#[async_trait]
impl BookStore for PostgresBookStore {
    async fn find_all(&self) -> Result<Vec<Book>, StorageError> {
        self.ensure_schema().await?;
        crud::find_all(&self.pool).await.map_err(storage_error)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, StorageError> {
        self.ensure_schema().await?;
        crud::find_by_id(&self.pool, id).await.map_err(storage_error)
    }

    async fn insert(&self, book: NewBook) -> Result<Book, StorageError> {
        book.validate()?;
        self.ensure_schema().await?;
        crud::insert(&self.pool, &book).await.map_err(storage_error)
    }

    async fn update_by_id(
        &self,
        id: &str,
        patch: BookPatch,
    ) -> Result<Option<Book>, StorageError> {
        patch.validate()?;
        self.ensure_schema().await?;
        crud::update_by_id(&self.pool, id, &patch)
            .await
            .map_err(storage_error)
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, StorageError> {
        self.ensure_schema().await?;
        crud::delete_by_id(&self.pool, id)
            .await
            .map_err(storage_error)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        pool::test_connection(&self.pool)
            .await
            .map_err(storage_error)
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        info!("PostgreSQL connection pool closed");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
