use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use bookshelf_db_memory::InMemoryBookStore;
use bookshelf_db_postgres::PostgresBookStore;
use bookshelf_graphql::{
    BookSchemaBuilder, GRAPHQL_PATH, GraphQLState, graphql_handler, graphql_handler_get,
};
use bookshelf_storage::DynBookStore;
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, StorageBackend, StorageConfig};
use crate::{handlers, middleware as app_middleware};

/// State for the service info and health endpoints.
#[derive(Clone)]
pub struct AppState {
    pub store: DynBookStore,
    pub started_at: DateTime<Utc>,
}

pub struct BookshelfServer {
    addr: SocketAddr,
    app: Router,
    store: DynBookStore,
    shutdown_timeout: Duration,
}

pub fn build_app(cfg: &AppConfig, store: DynBookStore) -> anyhow::Result<Router> {
    let schema = BookSchemaBuilder::new(cfg.graphql.to_schema_builder_config())
        .build()
        .context("building GraphQL schema")?;
    let graphql_state = GraphQLState::new(schema, store.clone(), &cfg.graphql);

    let app_state = AppState {
        store,
        started_at: Utc::now(),
    };

    let graphql_routes = Router::new()
        .route(
            GRAPHQL_PATH,
            get(graphql_handler_get).post(graphql_handler),
        )
        .with_state(graphql_state);

    let body_limit = cfg.server.body_limit_bytes;
    let app = Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .with_state(app_state)
        .merge(graphql_routes)
        // Layers added later run first: request id -> trace -> cors/compression -> body limit
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id));

    Ok(app)
}

/// Builds the configured book store.
///
/// For PostgreSQL with `fail_fast`, this retries the connection and fails
/// once retries are exhausted.
pub async fn create_store(cfg: &StorageConfig) -> anyhow::Result<DynBookStore> {
    let store: DynBookStore = match cfg.backend {
        StorageBackend::Memory => {
            let store = if cfg.seed_sample_data {
                InMemoryBookStore::with_sample_data()
            } else {
                InMemoryBookStore::new()
            };
            Arc::new(store)
        }
        StorageBackend::Postgres => {
            let pg = cfg
                .postgres
                .to_postgres_config()
                .context("storage.postgres.url is not set")?;
            let store = PostgresBookStore::new(pg)
                .await
                .context("connecting to PostgreSQL")?;
            Arc::new(store)
        }
    };
    tracing::info!(storage = store.backend_name(), "Book store ready");
    Ok(store)
}

pub struct ServerBuilder {
    config: AppConfig,
    store: Option<DynBookStore>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            store: None,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// Uses an existing store instead of building one from configuration.
    pub fn with_store(mut self, store: DynBookStore) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn build(self) -> anyhow::Result<BookshelfServer> {
        let store = match self.store {
            Some(store) => store,
            None => create_store(&self.config.storage).await?,
        };
        let app = build_app(&self.config, store.clone())?;

        Ok(BookshelfServer {
            addr: self.config.addr(),
            app,
            store,
            shutdown_timeout: self.config.shutdown_timeout(),
        })
    }
}

impl BookshelfServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves on the configured address until SIGINT or SIGTERM.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("binding {}", self.addr))?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on `listener` until `shutdown` resolves.
    ///
    /// After the shutdown future fires, in-flight requests get
    /// `shutdown_timeout` to finish. The store is closed in every case.
    /// Returns an error if serving failed, the drain timed out, or the store
    /// failed to close.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "listening");

        let draining = CancellationToken::new();
        let signal = {
            let draining = draining.clone();
            async move {
                shutdown.await;
                tracing::info!("shutdown signal received, draining in-flight requests");
                draining.cancel();
            }
        };

        let server = axum::serve(listener, self.app)
            .with_graceful_shutdown(signal)
            .into_future();
        tokio::pin!(server);

        let served: anyhow::Result<()> = tokio::select! {
            res = &mut server => res.map_err(anyhow::Error::from),
            _ = draining.cancelled() => {
                match tokio::time::timeout(self.shutdown_timeout, &mut server).await {
                    Ok(res) => res.map_err(anyhow::Error::from),
                    Err(_) => Err(anyhow::anyhow!(
                        "in-flight requests did not finish within {} ms",
                        self.shutdown_timeout.as_millis()
                    )),
                }
            }
        };

        if let Err(e) = &served {
            tracing::error!(error = %e, "server stopped with error");
        }

        let closed = self.store.close().await;
        match &closed {
            Ok(()) => tracing::info!(storage = self.store.backend_name(), "Book store closed"),
            Err(e) => tracing::error!(error = %e, "failed to close book store"),
        }

        served?;
        closed.context("closing book store")?;
        Ok(())
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received"),
        _ = terminate => tracing::info!("SIGTERM received"),
    }
}
