//! End-to-end HTTP tests against the in-memory backend on an ephemeral port.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bookshelf_db_memory::InMemoryBookStore;
use bookshelf_server::{AppConfig, ServerBuilder, StorageBackend};
use bookshelf_storage::{Book, BookPatch, BookStore, DynBookStore, NewBook, StorageError};
use serde_json::{Value, json};
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;

struct TestServer {
    base: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<anyhow::Result<()>>,
}

fn memory_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.storage.backend = StorageBackend::Memory;
    cfg.server.shutdown_timeout_ms = 2000;
    cfg
}

async fn start_server(cfg: AppConfig, store: DynBookStore) -> TestServer {
    let server = ServerBuilder::new()
        .with_config(cfg)
        .with_store(store)
        .build()
        .await
        .expect("build server");

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(server.serve(listener, async move {
        let _ = rx.await;
    }));

    TestServer {
        base: format!("http://{addr}"),
        shutdown: tx,
        handle,
    }
}

async fn graphql(client: &reqwest::Client, base: &str, query: &str, variables: Value) -> Value {
    let res = client
        .post(format!("{base}/graphql"))
        .json(&json!({ "query": query, "variables": variables }))
        .send()
        .await
        .expect("send");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    res.json().await.expect("json body")
}

#[tokio::test]
async fn service_info_and_health_endpoints() {
    let server = start_server(memory_config(), Arc::new(InMemoryBookStore::new())).await;
    let client = reqwest::Client::new();

    let root: Value = client
        .get(&server.base)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(root["service"], "Bookshelf GraphQL Server");
    assert_eq!(root["graphql"], "/graphql");
    assert_eq!(root["storage"], "memory");

    let health = client
        .get(format!("{}/healthz", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), reqwest::StatusCode::OK);

    let ready: Value = client
        .get(format!("{}/readyz", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ready["status"], "ready");

    let _ = server.shutdown.send(());
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn book_lifecycle_over_http() {
    let server = start_server(memory_config(), Arc::new(InMemoryBookStore::new())).await;
    let client = reqwest::Client::new();
    let base = server.base.as_str();

    let empty = graphql(&client, base, "{ books { id } }", json!({})).await;
    assert_eq!(empty, json!({ "data": { "books": [] } }));

    let added = graphql(
        &client,
        base,
        "mutation($t: String!, $a: String!, $y: Int!) { addBook(title: $t, author: $a, year: $y) { id title author year } }",
        json!({ "t": "Dune", "a": "Herbert", "y": 1965 }),
    )
    .await;
    let book = &added["data"]["addBook"];
    let id = book["id"].as_str().expect("id").to_string();
    assert_eq!(book["title"], "Dune");

    // year: 0 is ignored under the default update policy
    let updated = graphql(
        &client,
        base,
        "mutation($id: ID!) { updateBook(id: $id, year: 0) { year } }",
        json!({ "id": id }),
    )
    .await;
    assert_eq!(updated["data"]["updateBook"]["year"], 1965);

    let deleted = graphql(
        &client,
        base,
        "mutation($id: ID!) { deleteBook(id: $id) }",
        json!({ "id": id }),
    )
    .await;
    assert_eq!(deleted["data"]["deleteBook"], true);

    let missing = graphql(
        &client,
        base,
        "query($id: ID!) { book(id: $id) { id } }",
        json!({ "id": id }),
    )
    .await;
    let error = &missing["errors"][0];
    assert_eq!(error["code"], "FETCH_ERROR");
    assert!(error["message"].as_str().unwrap().contains(&id));

    let _ = server.shutdown.send(());
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn transport_errors_and_request_ids() {
    let server = start_server(memory_config(), Arc::new(InMemoryBookStore::new())).await;
    let client = reqwest::Client::new();
    let endpoint = format!("{}/graphql", server.base);

    // Malformed body
    let res = client
        .post(&endpoint)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"][0]["code"], "BAD_REQUEST");

    // Invalid query is still a 200 with errors
    let body = graphql(&client, &server.base, "{ books { nope } }", json!({})).await;
    assert!(body["errors"][0]["message"].is_string());
    assert!(body["errors"][0]["code"].is_string());

    // GET with a query executes it; without one serves GraphiQL
    let res = client
        .get(&endpoint)
        .query(&[("query", "{ books { id } }")])
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-42");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["books"], json!([]));

    let res = client.get(&endpoint).send().await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert!(res.text().await.unwrap().to_lowercase().contains("graphiql"));

    let _ = server.shutdown.send(());
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn playground_disabled_rejects_empty_get() {
    let mut cfg = memory_config();
    cfg.graphql.playground = false;
    let server = start_server(cfg, Arc::new(InMemoryBookStore::new())).await;

    let res = reqwest::get(format!("{}/graphql", server.base)).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let _ = server.shutdown.send(());
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_closes_the_store() {
    let store = Arc::new(InMemoryBookStore::with_sample_data());
    let server = start_server(memory_config(), store.clone()).await;

    let books = graphql(
        &reqwest::Client::new(),
        &server.base,
        "{ books { title } }",
        json!({}),
    )
    .await;
    assert_eq!(books["data"]["books"].as_array().unwrap().len(), 2);
    assert!(!store.is_closed());

    let _ = server.shutdown.send(());
    server.handle.await.unwrap().expect("clean shutdown");
    assert!(store.is_closed());
    assert!(store.ping().await.is_err());
}

#[tokio::test]
async fn readyz_reports_unavailable_store() {
    let store = Arc::new(InMemoryBookStore::new());
    store.close().await.unwrap();
    let server = start_server(memory_config(), store).await;

    let res = reqwest::get(format!("{}/readyz", server.base)).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "not_ready");
    assert!(body["error"].is_string());

    let _ = server.shutdown.send(());
    server.handle.await.unwrap().unwrap();
}

/// A store whose `find_all` never finishes in time.
#[derive(Default)]
struct StalledStore {
    entered: Notify,
    closed: AtomicBool,
}

#[async_trait]
impl BookStore for StalledStore {
    async fn find_all(&self) -> Result<Vec<Book>, StorageError> {
        self.entered.notify_one();
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<Book>, StorageError> {
        Ok(None)
    }

    async fn insert(&self, book: NewBook) -> Result<Book, StorageError> {
        Ok(book.into_book("1"))
    }

    async fn update_by_id(
        &self,
        _id: &str,
        _patch: BookPatch,
    ) -> Result<Option<Book>, StorageError> {
        Ok(None)
    }

    async fn delete_by_id(&self, _id: &str) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "stalled"
    }
}

#[tokio::test]
async fn drain_timeout_fails_shutdown_and_closes_store() {
    let store = Arc::new(StalledStore::default());
    let mut cfg = memory_config();
    cfg.server.shutdown_timeout_ms = 200;
    let server = start_server(cfg, store.clone()).await;

    let base = server.base.clone();
    let in_flight = tokio::spawn(async move {
        reqwest::Client::new()
            .post(format!("{base}/graphql"))
            .json(&json!({ "query": "{ books { id } }" }))
            .send()
            .await
    });

    // Shut down only once the request is inside the store.
    tokio::time::timeout(Duration::from_secs(5), store.entered.notified())
        .await
        .expect("request reached the store");
    let _ = server.shutdown.send(());

    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("serve returns after the drain timeout")
        .unwrap();
    let err = result.expect_err("drain timeout is a failed shutdown");
    assert!(err.to_string().contains("did not finish"), "{err}");
    assert!(store.closed.load(Ordering::SeqCst));

    in_flight.abort();
}
