use std::sync::Arc;

use account_api::auth::JwtService;
use account_api::auth::responses::{AuthResponse, ProfileResponse};
use account_api::error::ErrorEnvelope;
use account_api::store::MemoryCredentialStore;
use account_api::test_support::{TestRocketBuilder, test_auth_config};
use chrono::{Duration, Utc};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{Value, json};
use uuid::Uuid;

fn alice() -> Value {
    json!({
        "username": "alice",
        "email": "A@X.com",
        "password": "longenough1",
        "phoneNumber": "5551234567",
        "fullName": "Alice A"
    })
}

async fn post_json(client: &Client, uri: &'static str, body: &Value) -> (Status, Value) {
    let response = client
        .post(uri)
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    let status = response.status();
    let body = response.into_json::<Value>().await.expect("json body");
    (status, body)
}

async fn get_profile(client: &Client, authorization: Option<String>) -> (Status, Value) {
    let mut request = client.get("/api/auth/profile");
    if let Some(value) = authorization {
        request = request.header(Header::new("Authorization", value));
    }
    let response = request.dispatch().await;
    let status = response.status();
    let body = response.into_json::<Value>().await.expect("json body");
    (status, body)
}

async fn register_alice(client: &Client) -> AuthResponse {
    let (status, body) = post_json(client, "/api/auth/register", &alice()).await;
    assert_eq!(status, Status::Created, "unexpected body: {body}");
    serde_json::from_value(body).expect("auth response")
}

fn assert_error(body: &Value, message: &str) {
    let envelope: ErrorEnvelope = serde_json::from_value(body.clone()).expect("error envelope");
    assert!(!envelope.success);
    assert_eq!(envelope.message, message);
}

#[tokio::test]
async fn register_then_login_issues_tokens_for_the_same_account() {
    let client = TestRocketBuilder::new().async_client().await;
    let tokens = JwtService::from_config(&test_auth_config()).expect("jwt service");

    let (status, body) = post_json(&client, "/api/auth/register", &alice()).await;
    assert_eq!(status, Status::Created);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["fullName"], "Alice A");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    let registered: AuthResponse = serde_json::from_value(body).expect("auth response");
    assert!(!registered.token.is_empty());
    assert_eq!(tokens.verify(&registered.token).expect("verify"), registered.user.id);

    let (status, body) = post_json(
        &client,
        "/api/auth/login",
        &json!({ "email": "a@x.com", "password": "longenough1" }),
    )
    .await;
    assert_eq!(status, Status::Ok);
    let logged_in: AuthResponse = serde_json::from_value(body).expect("auth response");
    assert_eq!(logged_in.user.id, registered.user.id);
    assert_eq!(tokens.verify(&logged_in.token).expect("verify"), registered.user.id);
}

#[tokio::test]
async fn duplicate_email_or_username_is_rejected() {
    let client = TestRocketBuilder::new().async_client().await;
    register_alice(&client).await;

    let mut same_email = alice();
    same_email["username"] = json!("alice2");
    let (status, body) = post_json(&client, "/api/auth/register", &same_email).await;
    assert_eq!(status, Status::BadRequest);
    assert_error(&body, "User already exists");

    let mut same_username = alice();
    same_username["email"] = json!("other@x.com");
    let (status, body) = post_json(&client, "/api/auth/register", &same_username).await;
    assert_eq!(status, Status::BadRequest);
    assert_error(&body, "User already exists");
}

#[tokio::test]
async fn invalid_fields_are_reported_with_their_messages() {
    let client = TestRocketBuilder::new().async_client().await;

    let mut payload = alice();
    payload["phoneNumber"] = json!("555-123");
    let (status, body) = post_json(&client, "/api/auth/register", &payload).await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["success"], false);
    assert_error(
        &body,
        "555-123 is not a valid phone number! Format: 1234567890",
    );

    let (status, body) = post_json(&client, "/api/auth/register", &json!({})).await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn malformed_body_is_invalid_user_data() {
    let client = TestRocketBuilder::new().async_client().await;

    let response = client
        .post("/api/auth/register")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let body = response.into_json::<Value>().await.expect("json body");
    assert_error(&body, "Invalid user data");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_identical() {
    let client = TestRocketBuilder::new().async_client().await;
    register_alice(&client).await;

    let (wrong_status, wrong_body) = post_json(
        &client,
        "/api/auth/login",
        &json!({ "email": "a@x.com", "password": "not-the-password" }),
    )
    .await;
    let (unknown_status, unknown_body) = post_json(
        &client,
        "/api/auth/login",
        &json!({ "email": "nobody@x.com", "password": "longenough1" }),
    )
    .await;

    assert_eq!(wrong_status, Status::Unauthorized);
    assert_eq!(unknown_status, Status::Unauthorized);
    assert_error(&wrong_body, "Invalid email or password");
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn profile_returns_account_with_timestamps() {
    let client = TestRocketBuilder::new().async_client().await;
    let registered = register_alice(&client).await;

    let (status, body) = get_profile(&client, Some(format!("Bearer {}", registered.token))).await;
    assert_eq!(status, Status::Ok);

    let profile: ProfileResponse = serde_json::from_value(body).expect("profile response");
    assert!(profile.success);
    assert_eq!(profile.user.id, registered.user.id);
    assert!(profile.user.created_at.is_some());
}

#[tokio::test]
async fn login_records_last_login() {
    let client = TestRocketBuilder::new().async_client().await;
    register_alice(&client).await;

    let (_, body) = post_json(
        &client,
        "/api/auth/login",
        &json!({ "email": "a@x.com", "password": "longenough1" }),
    )
    .await;
    let logged_in: AuthResponse = serde_json::from_value(body).expect("auth response");

    let (_, body) = get_profile(&client, Some(format!("Bearer {}", logged_in.token))).await;
    let profile: ProfileResponse = serde_json::from_value(body).expect("profile response");
    assert!(profile.user.last_login.is_some());
}

#[tokio::test]
async fn profile_without_token_is_unauthorized() {
    let client = TestRocketBuilder::new().async_client().await;

    let (status, body) = get_profile(&client, None).await;
    assert_eq!(status, Status::Unauthorized);
    assert_error(&body, "Not authorized, no token");

    let (status, body) = get_profile(&client, Some("Basic abc".into())).await;
    assert_eq!(status, Status::Unauthorized);
    assert_error(&body, "Not authorized, no token");
}

#[tokio::test]
async fn profile_with_bad_token_is_unauthorized() {
    let client = TestRocketBuilder::new().async_client().await;

    let (status, body) = get_profile(&client, Some("Bearer garbage".into())).await;
    assert_eq!(status, Status::Unauthorized);
    assert_error(&body, "Not authorized, token failed");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let client = TestRocketBuilder::new().async_client().await;
    let registered = register_alice(&client).await;
    let tokens = JwtService::from_config(&test_auth_config()).expect("jwt service");

    let stale = tokens
        .issue_at(registered.user.id, Utc::now() - Duration::days(31))
        .expect("issue");

    let (status, body) = get_profile(&client, Some(format!("Bearer {}", stale.token))).await;
    assert_eq!(status, Status::Unauthorized);
    assert_error(&body, "Not authorized, token failed");
}

#[tokio::test]
async fn profile_for_vanished_account_is_not_found() {
    let store = Arc::new(MemoryCredentialStore::new());
    let client = TestRocketBuilder::new()
        .with_store(store.clone())
        .async_client()
        .await;
    let registered = register_alice(&client).await;

    assert!(store.remove(registered.user.id).is_some());

    let (status, body) = get_profile(&client, Some(format!("Bearer {}", registered.token))).await;
    assert_eq!(status, Status::NotFound);
    assert_error(&body, "User not found");
}

#[tokio::test]
async fn token_for_unknown_subject_is_not_found() {
    let client = TestRocketBuilder::new().async_client().await;
    let tokens = JwtService::from_config(&test_auth_config()).expect("jwt service");
    let token = tokens.issue(Uuid::new_v4()).expect("issue");

    let (status, body) = get_profile(&client, Some(format!("Bearer {}", token.token))).await;
    assert_eq!(status, Status::NotFound);
    assert_error(&body, "User not found");
}

#[tokio::test]
async fn profile_reads_the_account_once() {
    let store = Arc::new(MemoryCredentialStore::new());
    let client = TestRocketBuilder::new()
        .with_store(store.clone())
        .async_client()
        .await;
    let registered = register_alice(&client).await;

    let reads_before = store.reads();
    let (status, _) = get_profile(&client, Some(format!("Bearer {}", registered.token))).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(store.reads() - reads_before, 1);
}

#[tokio::test]
async fn non_ascii_phone_digits_are_rejected() {
    let store = Arc::new(MemoryCredentialStore::new());
    let client = TestRocketBuilder::new()
        .with_store(store.clone())
        .async_client()
        .await;

    let mut payload = alice();
    payload["phoneNumber"] = json!("٥٥٥١٢٣٤٥٦٧");
    let (status, body) = post_json(&client, "/api/auth/register", &payload).await;

    assert_eq!(status, Status::BadRequest);
    assert_error(
        &body,
        "٥٥٥١٢٣٤٥٦٧ is not a valid phone number! Format: 1234567890",
    );
    assert!(store.is_empty());
}
