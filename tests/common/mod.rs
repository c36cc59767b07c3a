// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blog::{
    config::Config,
    create_router, db,
    error::AppError,
    services::mail::{ContactMessage, Mailer},
    state::AppState,
};
use sqlx::SqlitePool;

pub const PASSWORD: &str = "password123";

/// Mailer double: records what it was asked to send, or fails every time.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<ContactMessage>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<ContactMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &ContactMessage) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::TransportFailure(
                "535 authentication failed".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub config: Config,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn count(&self, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .unwrap();
        n
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        session_secret: "test_secret_for_integration_tests".to_string(),
        session_ttl_secs: 600,
        secure_cookies: false,
        bind_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
        mail: None,
    }
}

/// Fresh in-memory store with the schema applied.
pub async fn test_pool() -> SqlitePool {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database");
    db::init_schema(&pool)
        .await
        .expect("Failed to create schema");
    pool
}

pub fn test_state(pool: SqlitePool, mailer: Arc<dyn Mailer>) -> AppState {
    AppState {
        pool,
        config: test_config(),
        mailer,
    }
}

/// Spawns the app on a random port with a private database.
pub async fn spawn_app_with(mailer: Arc<dyn Mailer>) -> TestApp {
    let pool = test_pool().await;
    let state = test_state(pool.clone(), mailer);
    let config = state.config.clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        config,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(RecordingMailer::default())).await
}

/// Client that keeps the session cookie between requests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

/// Registers a fresh user on `client`, leaving it logged in.
/// Returns (email, name).
pub async fn register(app: &TestApp, client: &reqwest::Client) -> (String, String) {
    let name = unique("u");
    let email = format!("{}@example.com", name);

    let response = client
        .post(app.url("/register"))
        .json(&serde_json::json!({
            "email": email,
            "name": name,
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    (email, name)
}

pub async fn login(app: &TestApp, client: &reqwest::Client, email: &str) {
    let response = client
        .post(app.url("/login"))
        .json(&serde_json::json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
}

pub async fn logout(app: &TestApp, client: &reqwest::Client) {
    client.get(app.url("/logout")).send().await.unwrap();
}

pub fn post_json(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "subtitle": "A subtitle",
        "body": "<p>Hello <b>world</b></p>",
        "img_url": "https://images.example.com/cover.jpg",
    })
}

/// Creates a post as whoever `client` is logged in as. Returns its id.
pub async fn create_post(app: &TestApp, client: &reqwest::Client, title: &str) -> i64 {
    let response = client
        .post(app.url("/new-post"))
        .json(&post_json(title))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    body["post"]["id"].as_i64().expect("post id missing")
}

pub async fn page(app: &TestApp, client: &reqwest::Client, path: &str) -> serde_json::Value {
    client
        .get(app.url(path))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse json")
}
