// tests/auth_tests.rs

mod common;

use blog::{
    error::AppError,
    models::user::{LoginRequest, RegisterRequest},
    services::auth::{self, SessionSettings},
    session::{Session, verify_session},
};
use common::*;

const SETTINGS: SessionSettings<'static> = SessionSettings {
    secret: "service_test_secret",
    ttl_secs: 600,
};

fn register_form(email: &str, name: &str, confirmation: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        name: name.to_string(),
        password: PASSWORD.to_string(),
        password_confirmation: confirmation.to_string(),
    }
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = spawn_app().await;

    let response = client()
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_logs_in_immediately() {
    let app = spawn_app().await;
    let client = client();

    let (_, name) = register(&app, &client).await;

    let index = page(&app, &client, "/").await;
    assert_eq!(index["logged_in"], true);
    assert_eq!(index["user_name"], name.as_str());
}

#[tokio::test]
async fn register_response_omits_password() {
    let app = spawn_app().await;
    let name = unique("u");

    let body: serde_json::Value = client()
        .post(app.url("/register"))
        .json(&serde_json::json!({
            "email": format!("{}@example.com", name),
            "name": name,
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["name"], name.as_str());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn register_with_known_email_points_to_login() {
    let app = spawn_app().await;
    let (email, _) = register(&app, &client()).await;

    let response = client()
        .post(app.url("/register"))
        .json(&serde_json::json!({
            "email": email,
            "name": unique("other"),
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "validation_conflict");
    assert_eq!(body["redirect"], "/login");
    assert_eq!(app.count("users").await, 1);
}

#[tokio::test]
async fn register_with_taken_name_conflicts() {
    let app = spawn_app().await;
    let (_, name) = register(&app, &client()).await;

    let response = client()
        .post(app.url("/register"))
        .json(&serde_json::json!({
            "email": "someone.else@example.com",
            "name": name,
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "This username is taken already");
    assert_eq!(app.count("users").await, 1);
}

#[tokio::test]
async fn register_with_mismatched_passwords_creates_nothing() {
    let app = spawn_app().await;
    let client = client();

    let response = client
        .post(app.url("/register"))
        .json(&serde_json::json!({
            "email": "mismatch@example.com",
            "name": "mismatch",
            "password": PASSWORD,
            "password_confirmation": "password124",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Passwords are not the same");
    assert_eq!(app.count("users").await, 0);

    let index = page(&app, &client, "/").await;
    assert_eq!(index["logged_in"], false);
}

#[tokio::test]
async fn register_rejects_malformed_email() {
    let app = spawn_app().await;

    let response = client()
        .post(app.url("/register"))
        .json(&serde_json::json!({
            "email": "not-an-email",
            "name": "someone",
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.count("users").await, 0);
}

#[tokio::test]
async fn stored_password_is_a_salted_hash() {
    let app = spawn_app().await;
    register(&app, &client()).await;
    register(&app, &client()).await;

    let hashes: Vec<(String,)> = sqlx::query_as("SELECT password FROM users")
        .fetch_all(&app.pool)
        .await
        .unwrap();

    assert_eq!(hashes.len(), 2);
    for (hash,) in &hashes {
        assert_ne!(hash, PASSWORD);
        assert!(hash.starts_with("$argon2"));
    }
    // Same password, different salts.
    assert_ne!(hashes[0].0, hashes[1].0);
}

#[tokio::test]
async fn login_with_correct_password_establishes_session() {
    let app = spawn_app().await;
    let (email, name) = register(&app, &client()).await;
    let client = client();

    login(&app, &client, &email).await;

    let index = page(&app, &client, "/").await;
    assert_eq!(index["logged_in"], true);
    assert_eq!(index["user_name"], name.as_str());
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let app = spawn_app().await;
    let (email, _) = register(&app, &client()).await;
    let client = client();

    let response = client
        .post(app.url("/login"))
        .json(&serde_json::json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    assert!(response.headers().get("set-cookie").is_none());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "credential_mismatch");

    let index = page(&app, &client, "/").await;
    assert_eq!(index["logged_in"], false);
}

#[tokio::test]
async fn login_with_unknown_email_is_rejected() {
    let app = spawn_app().await;

    let response = client()
        .post(app.url("/login"))
        .json(&serde_json::json!({ "email": "nobody@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "We don't have this email in our database");
}

#[tokio::test]
async fn logout_ends_session_and_is_idempotent() {
    let app = spawn_app().await;
    let client = client();
    register(&app, &client).await;

    logout(&app, &client).await;
    let index = page(&app, &client, "/").await;
    assert_eq!(index["logged_in"], false);

    let response = client.get(app.url("/logout")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn tampered_session_cookie_is_anonymous() {
    let app = spawn_app().await;

    let index: serde_json::Value = reqwest::Client::new()
        .get(app.url("/"))
        .header("Cookie", "blog_session=not.a.token")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(index["logged_in"], false);
    assert_eq!(index["user_name"], "");
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let pool = test_pool().await;
    let config = test_config();
    let settings = SessionSettings {
        secret: &config.session_secret,
        ttl_secs: 60,
    };
    let established = auth::register(
        &pool,
        settings,
        &register_form("bearer@example.com", "bearer", PASSWORD),
    )
    .await
    .unwrap();

    let app = spawn_app().await;
    // Different database, same secret: the token itself carries the identity.
    let index: serde_json::Value = reqwest::Client::new()
        .get(app.url("/"))
        .bearer_auth(&established.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(index["logged_in"], true);
    assert_eq!(index["user_name"], "bearer");
}

#[tokio::test]
async fn service_register_checks_email_before_name_before_passwords() {
    let pool = test_pool().await;
    auth::register(&pool, SETTINGS, &register_form("a@example.com", "alice", PASSWORD))
        .await
        .unwrap();

    let err = auth::register(&pool, SETTINGS, &register_form("a@example.com", "alice", "x"))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::EmailAlreadyRegistered);

    let err = auth::register(&pool, SETTINGS, &register_form("b@example.com", "alice", "x"))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::UsernameTaken);

    let err = auth::register(&pool, SETTINGS, &register_form("b@example.com", "bob", "x"))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::PasswordMismatch);

    let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 1);
}

#[tokio::test]
async fn service_session_round_trips_through_token() {
    let pool = test_pool().await;
    let established = auth::register(
        &pool,
        SETTINGS,
        &register_form("carol@example.com", "carol", PASSWORD),
    )
    .await
    .unwrap();

    let session = verify_session(&established.token, SETTINGS.secret).unwrap();
    assert_eq!(session, established.session);

    let user = auth::current_identity(&pool, &session).await.unwrap().unwrap();
    assert_eq!(user.email, "carol@example.com");

    assert!(verify_session(&established.token, "another_secret").is_err());
}

#[tokio::test]
async fn service_login_and_logout() {
    let pool = test_pool().await;
    auth::register(&pool, SETTINGS, &register_form("dave@example.com", "dave", PASSWORD))
        .await
        .unwrap();

    let err = auth::login(
        &pool,
        SETTINGS,
        &LoginRequest {
            email: "dave@example.com".to_string(),
            password: "nope".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err, AppError::InvalidCredentials);

    let established = auth::login(
        &pool,
        SETTINGS,
        &LoginRequest {
            email: "dave@example.com".to_string(),
            password: PASSWORD.to_string(),
        },
    )
    .await
    .unwrap();
    assert!(established.session.is_authenticated());

    let session = auth::logout(&established.session);
    assert_eq!(session, Session::Anonymous);
    assert_eq!(auth::logout(&session), Session::Anonymous);
    assert!(auth::current_identity(&pool, &session).await.unwrap().is_none());
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let pool = test_pool().await;

    let err = auth::register(&pool, SETTINGS, &register_form("e@example.com", "   ", PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
    let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[tokio::test]
async fn blank_name_over_http_is_400() {
    let app = spawn_app().await;

    let response = client()
        .post(app.url("/register"))
        .json(&serde_json::json!({
            "email": "blank@example.com",
            "name": "   ",
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.count("users").await, 0);
}

#[tokio::test]
async fn padded_email_and_name_are_trimmed_before_validation() {
    let pool = test_pool().await;

    let established = auth::register(
        &pool,
        SETTINGS,
        &register_form("  frank@example.com ", " frank ", PASSWORD),
    )
    .await
    .unwrap();
    assert_eq!(established.user.email, "frank@example.com");
    assert_eq!(established.user.name, "frank");

    let err = auth::register(
        &pool,
        SETTINGS,
        &register_form("frank@example.com", "frank2", PASSWORD),
    )
    .await
    .unwrap_err();
    assert_eq!(err, AppError::EmailAlreadyRegistered);
}
