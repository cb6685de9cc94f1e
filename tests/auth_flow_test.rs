//! Router-level tests for registration, login, token resolution and the
//! admin bootstrap route.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use uuid::Uuid;

use common::TestApp;
use quill_api::UserRole;

#[tokio::test]
async fn register_sets_cookie_and_returns_user_token() {
    let app = TestApp::new();

    let response = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Alice", "email": "Alice@Example.com", "password": "secret1" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["user"]["email"], "alice@example.com");
    assert_eq!(response.body["data"]["user"]["role"], "user");
    assert!(response.body["data"]["user"].get("password").is_none());

    let cookie = response.set_cookie().expect("set-cookie header");
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let identity = app.tokens.verify(&response.access_token()).unwrap();
    assert_eq!(identity.id, response.user_id());
    assert_eq!(identity.role, UserRole::User);
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com", "secret1").await;

    let response = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Other", "email": " ALICE@example.com ", "password": "secret1" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn register_reports_field_errors() {
    let app = TestApp::new();

    let response = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "A", "email": "not-an-email", "password": "123" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = response.body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn login_accepts_correct_password_only() {
    let app = TestApp::new();
    let (_, alice_id) = app.register("Alice", "alice@example.com", "secret1").await;

    let ok = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "secret1" })),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.set_cookie().is_some());
    let identity = app.tokens.verify(&ok.access_token()).unwrap();
    assert_eq!(identity.id, alice_id);
    assert_eq!(identity.role, UserRole::User);

    let wrong = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "wrong-pass" })),
        )
        .await;
    let unknown = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "secret1" })),
        )
        .await;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body, unknown.body);
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let app = TestApp::new();
    let (token, alice_id) = app.register("Alice", "alice@example.com", "secret1").await;

    let missing = app.call(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = app.call(Method::GET, "/api/auth/me", Some("not.a.jwt"), None).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);

    let expired = app.expired_token(alice_id, UserRole::User);
    let expired = app.call(Method::GET, "/api/auth/me", Some(&expired), None).await;
    assert_eq!(expired.status, StatusCode::UNAUTHORIZED);

    let ok = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["data"]["user"]["id"], alice_id.to_string());
}

#[tokio::test]
async fn me_accepts_the_session_cookie() {
    let app = TestApp::new();
    let (token, _) = app.register("Alice", "alice@example.com", "secret1").await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("theme=dark; token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user"]["name"], "Alice");
}

#[tokio::test]
async fn token_for_deleted_account_is_rejected() {
    let app = TestApp::new();
    let admin = app.register_admin(None, "root@example.com").await;
    let admin_token = admin.access_token();
    let (alice_token, alice_id) = app.register("Alice", "alice@example.com", "secret1").await;

    let deleted = app
        .call(
            Method::DELETE,
            &format!("/api/users/{alice_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let response = app.call(Method::GET, "/api/auth/me", Some(&alice_token), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_admin_can_be_created_anonymously() {
    let app = TestApp::new();

    let response = app.register_admin(None, "root@example.com").await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["user"]["role"], "admin");
    assert!(response.set_cookie().is_none());
    let identity = app.tokens.verify(&response.access_token()).unwrap();
    assert_eq!(identity.role, UserRole::Admin);
}

#[tokio::test]
async fn invalid_token_counts_as_anonymous_on_bootstrap() {
    let app = TestApp::new();

    let response = app.register_admin(Some("garbage-token"), "root@example.com").await;

    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn second_admin_needs_an_admin_caller() {
    let app = TestApp::new();
    let first = app.register_admin(None, "root@example.com").await;
    let (user_token, _) = app.register("Alice", "alice@example.com", "secret1").await;

    let anonymous = app.register_admin(None, "second@example.com").await;
    assert_eq!(anonymous.status, StatusCode::FORBIDDEN);

    let by_user = app.register_admin(Some(&user_token), "second@example.com").await;
    assert_eq!(by_user.status, StatusCode::FORBIDDEN);

    let by_admin = app
        .register_admin(Some(&first.access_token()), "second@example.com")
        .await;
    assert_eq!(by_admin.status, StatusCode::CREATED);
    assert_eq!(by_admin.body["data"]["user"]["role"], "admin");
}

#[tokio::test]
async fn expired_admin_token_cannot_add_second_admin() {
    let app = TestApp::new();
    let first = app.register_admin(None, "root@example.com").await;
    let expired = app.expired_token(first.user_id(), UserRole::Admin);

    let response = app.register_admin(Some(&expired), "second@example.com").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let admins = app
        .call(Method::GET, "/api/users", Some(&first.access_token()), None)
        .await;
    assert_eq!(admins.body["meta"]["total"], 1);
}

#[tokio::test]
async fn bootstrap_closes_after_two_admins() {
    let app = TestApp::new();
    let first = app.register_admin(None, "root@example.com").await;
    let first_token = first.access_token();
    let second = app
        .register_admin(Some(&first_token), "second@example.com")
        .await;
    assert_eq!(second.status, StatusCode::CREATED);

    let third = app
        .register_admin(Some(&first_token), "third@example.com")
        .await;
    assert_eq!(third.status, StatusCode::FORBIDDEN);

    let anonymous = app.register_admin(None, "fourth@example.com").await;
    assert_eq!(anonymous.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bootstrap_gate_runs_before_body_validation() {
    let app = TestApp::new();
    app.register_admin(None, "root@example.com").await;

    // Anonymous caller with a bad body still gets the policy answer.
    let response = app
        .call(
            Method::POST,
            "/api/auth/register-admin",
            None,
            Some(json!({ "name": "", "email": "nope", "password": "x" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/register-admin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.send(malformed).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bootstrap_enforces_admin_password_length() {
    let app = TestApp::new();

    let response = app
        .call(
            Method::POST,
            "/api/auth/register-admin",
            None,
            Some(json!({ "name": "Root", "email": "root@example.com", "password": "short1" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn update_profile_with_no_fields_is_rejected() {
    let app = TestApp::new();
    let (token, _) = app.register("Alice", "alice@example.com", "secret1").await;

    let empty = app
        .call(Method::PUT, "/api/auth/me", Some(&token), Some(json!({})))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let renamed = app
        .call(
            Method::PUT,
            "/api/auth/me",
            Some(&token),
            Some(json!({ "name": "Alice Liddell" })),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["data"]["user"]["name"], "Alice Liddell");
}

#[tokio::test]
async fn update_profile_rejects_taken_email() {
    let app = TestApp::new();
    let (token, _) = app.register("Alice", "alice@example.com", "secret1").await;
    app.register("Bob", "bob@example.com", "secret1").await;

    let response = app
        .call(
            Method::PUT,
            "/api/auth/me",
            Some(&token),
            Some(json!({ "email": "bob@example.com" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn change_password_then_login_with_new_one() {
    let app = TestApp::new();
    let (token, _) = app.register("Alice", "alice@example.com", "secret1").await;

    let missing = app
        .call(
            Method::PUT,
            "/api/auth/me/password",
            Some(&token),
            Some(json!({ "currentPassword": "secret1" })),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let wrong = app
        .call(
            Method::PUT,
            "/api/auth/me/password",
            Some(&token),
            Some(json!({ "currentPassword": "nope-nope", "newPassword": "brand-new-1" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);

    let changed = app
        .call(
            Method::PUT,
            "/api/auth/me/password",
            Some(&token),
            Some(json!({ "currentPassword": "secret1", "newPassword": "brand-new-1" })),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);

    let old = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "secret1" })),
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "brand-new-1" })),
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = TestApp::new();
    let (token, _) = app.register("Alice", "alice@example.com", "secret1").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/logout")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Logged out");
    let cookie = response.set_cookie().expect("removal cookie");
    assert!(cookie.starts_with("token="));
}

#[tokio::test]
async fn role_in_token_is_not_trusted_over_the_store() {
    let app = TestApp::new();
    app.register_admin(None, "root@example.com").await;
    let (_, alice_id) = app.register("Alice", "alice@example.com", "secret1").await;

    // Correctly signed, but claims a role the account does not have.
    let forged = app
        .tokens
        .issue(&quill_api::Identity::new(alice_id, UserRole::Admin))
        .unwrap()
        .access_token;

    let response = app.call(Method::GET, "/api/users", Some(&forged), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let unknown = app
        .tokens
        .issue(&quill_api::Identity::new(Uuid::new_v4(), UserRole::Admin))
        .unwrap()
        .access_token;
    let response = app.call(Method::GET, "/api/users", Some(&unknown), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
