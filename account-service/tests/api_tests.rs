mod common;

use account_service::domain::social::models::SocialIdentity;
use auth::Purpose;
use chrono::Duration;
use chrono::Utc;
use common::TestApp;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Value;

async fn body(response: reqwest::Response) -> Value {
    response.json().await.expect("Failed to parse response")
}

fn assert_invalid_token(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["reason"], "invalid_token");
    assert_eq!(body["data"]["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/users")
        .json(&json!({
            "username": "nicola",
            "email": "Nicola@Example.com",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body(response).await;
    assert_eq!(body["status_code"], 201);
    assert_eq!(body["data"]["user"]["username"], "nicola");
    assert_eq!(body["data"]["user"]["email"], "nicola@example.com");
    assert_eq!(body["data"]["user"]["is_activated"], false);
    assert!(body["data"]["user"].get("password_hash").is_none());

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].action_link.contains("/api/users/activate/"));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    app.register("nicola", "nicola@example.com", "password123").await;

    let response = app
        .post("/api/users")
        .json(&json!({
            "username": "another",
            "email": "nicola@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body(response).await;
    assert_eq!(body["data"]["reason"], "validation_error");
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));
}

#[tokio::test]
async fn test_register_validation_and_missing_fields() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/users")
        .json(&json!({ "username": "nicola", "email": "nicola@example.com", "password": "short" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post("/api/users")
        .json(&json!({ "username": "nicola", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["data"]["reason"], "missing_field");

    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_register_reports_mail_failure() {
    let app = TestApp::spawn().await;
    app.mailer.fail_deliveries(true);

    let response = app
        .post("/api/users")
        .json(&json!({
            "username": "nicola",
            "email": "nicola@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body(response).await["data"]["reason"], "mail_delivery_failed");
    // The account exists, so a resend can recover.
    assert!(app.repository.find_email("nicola@example.com").is_some());

    app.mailer.fail_deliveries(false);
    let response = app
        .post("/api/users/activation/resend")
        .json(&json!({ "email": "nicola@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_activation_is_idempotent() {
    let app = TestApp::spawn().await;
    let token = app
        .register("nicola", "nicola@example.com", "password123")
        .await;

    let first = app
        .get(&format!("/api/users/activate/{}", token))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(
        body(first).await["data"]["message"],
        "Account activated, you can now sign in"
    );

    let second = app
        .get(&format!("/api/users/activate/{}", token))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(
        body(second).await["data"]["message"],
        "Account is already activated"
    );

    let user = app.repository.find_email("nicola@example.com").unwrap();
    assert!(user.is_activated);
}

#[tokio::test]
async fn test_activation_rejects_bad_tokens_uniformly() {
    let app = TestApp::spawn().await;
    let token = app
        .register("nicola", "nicola@example.com", "password123")
        .await;
    let user = app.repository.find_email("nicola@example.com").unwrap();

    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let expired = app
        .tokens
        .issue_at(
            user.id,
            Purpose::Activation,
            Duration::hours(24),
            Utc::now() - Duration::hours(25),
        )
        .unwrap()
        .token;

    let reset = app
        .tokens
        .issue(user.id, Purpose::PasswordReset, Duration::hours(1))
        .unwrap()
        .token;

    for bad in ["not-a-token".to_string(), tampered, expired, reset] {
        let response = app
            .get(&format!("/api/users/activate/{}", bad))
            .send()
            .await
            .expect("Failed to execute request");
        let status = response.status();
        assert_invalid_token(status, &body(response).await);
    }

    assert!(!app.repository.get(&user.id).unwrap().is_activated);
}

#[tokio::test]
async fn test_login_with_email_or_username() {
    let app = TestApp::spawn().await;
    app.register("nicola", "nicola@example.com", "password123")
        .await;

    // Activation is not required to sign in.
    for credentials in [
        json!({ "email": "nicola@example.com", "password": "password123" }),
        json!({ "username": "nicola", "password": "password123" }),
    ] {
        let response = app
            .post("/api/users/login")
            .json(&credentials)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body(response).await;
        assert_eq!(body["data"]["user"]["username"], "nicola");
        let token = body["data"]["token"].as_str().unwrap();
        assert!(app.tokens.verify_for(token, Purpose::Session).is_ok());
    }
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let app = TestApp::spawn().await;
    app.register("nicola", "nicola@example.com", "password123")
        .await;

    let wrong_password = app
        .post("/api/users/login")
        .json(&json!({ "email": "nicola@example.com", "password": "password999" }))
        .send()
        .await
        .expect("Failed to execute request");
    let unknown_user = app
        .post("/api/users/login")
        .json(&json!({ "email": "ghost@example.com", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(wrong_password).await["data"], body(unknown_user).await["data"]);
}

#[tokio::test]
async fn test_resend_activation_unknown_email() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/users/activation/resend")
        .json(&json!({ "email": "ghost@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(response).await["data"]["reason"], "unknown_email");

    let response = app
        .post("/api/users/activation/resend")
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["data"]["reason"], "missing_field");
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::spawn().await;
    app.signed_in_user("nicola", "nicola@example.com", "password123")
        .await;

    let response = app
        .post("/api/users/password/reset")
        .json(&json!({ "email": "nicola@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let reset_token = app.last_token_for("nicola@example.com");

    let same = app
        .put(&format!("/api/users/password/reset/{}", reset_token))
        .json(&json!({ "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(same.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(same).await["data"]["reason"], "same_password");

    let response = app
        .put(&format!("/api/users/password/reset/{}", reset_token))
        .json(&json!({ "password": "newpassword456" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let old = app
        .post("/api/users/login")
        .json(&json!({ "email": "nicola@example.com", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = app
        .post("/api/users/login")
        .json(&json!({ "email": "nicola@example.com", "password": "newpassword456" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_requires_password() {
    let app = TestApp::spawn().await;
    app.signed_in_user("nicola", "nicola@example.com", "password123")
        .await;

    app.post("/api/users/password/reset")
        .json(&json!({ "email": "nicola@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");
    let reset_token = app.last_token_for("nicola@example.com");

    for payload in [json!({}), json!({ "password": "" })] {
        let response = app
            .put(&format!("/api/users/password/reset/{}", reset_token))
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(response).await["data"]["reason"], "missing_field");
    }
}

#[tokio::test]
async fn test_password_reset_requires_activation() {
    let app = TestApp::spawn().await;
    app.register("nicola", "nicola@example.com", "password123")
        .await;

    let response = app
        .post("/api/users/password/reset")
        .json(&json!({ "email": "nicola@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["data"]["reason"], "not_activated");
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_activation_token_cannot_reset_password() {
    let app = TestApp::spawn().await;
    let activation = app
        .register("nicola", "nicola@example.com", "password123")
        .await;

    let response = app
        .put(&format!("/api/users/password/reset/{}", activation))
        .json(&json!({ "password": "newpassword456" }))
        .send()
        .await
        .expect("Failed to execute request");

    let status = response.status();
    assert_invalid_token(status, &body(response).await);
}

#[tokio::test]
async fn test_current_user() {
    let app = TestApp::spawn().await;
    let session = app
        .signed_in_user("nicola", "nicola@example.com", "password123")
        .await;

    let response = app
        .get("/api/user")
        .bearer_auth(&session)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["data"]["username"], "nicola");

    let response = app
        .put("/api/user")
        .bearer_auth(&session)
        .json(&json!({ "username": "nicola_d" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["data"]["username"], "nicola_d");
}

#[tokio::test]
async fn test_current_user_requires_session_token() {
    let app = TestApp::spawn().await;
    let activation = app
        .register("nicola", "nicola@example.com", "password123")
        .await;

    let response = app
        .get("/api/user")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .get("/api/user")
        .bearer_auth(&activation)
        .send()
        .await
        .expect("Failed to execute request");
    let status = response.status();
    assert_invalid_token(status, &body(response).await);
}

fn google_identity(uid: &str, email: &str) -> SocialIdentity {
    SocialIdentity {
        provider: "google".to_string(),
        uid: uid.to_string(),
        email: Some(email.to_string()),
        username: Some("Jane Smith".to_string()),
    }
}

#[tokio::test]
async fn test_social_sign_in_creates_account() {
    let app = TestApp::spawn().await;
    app.social_client
        .accept("google-token", google_identity("g-1", "jane@example.com"));

    let response = app
        .post("/api/users/oauth")
        .json(&json!({ "provider": "google", "access_token": "google-token" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body(response).await;
    assert_eq!(body["data"]["email"], "jane@example.com");
    assert_eq!(body["data"]["username"], "JaneSmith");
    assert!(app
        .tokens
        .verify_for(body["data"]["token"].as_str().unwrap(), Purpose::Session)
        .is_ok());

    let user = app.repository.find_email("jane@example.com").unwrap();
    assert!(user.is_activated);

    // Signing in again resolves to the same account.
    let again: Value = app
        .post("/api/users/oauth")
        .json(&json!({ "provider": "google", "access_token": "google-token" }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(again["data"]["username"], "JaneSmith");
}

#[tokio::test]
async fn test_social_sign_in_links_existing_email() {
    let app = TestApp::spawn().await;
    app.register("nicola", "nicola@example.com", "password123")
        .await;
    app.social_client
        .accept("google-token", google_identity("g-2", "nicola@example.com"));

    let response = app
        .post("/api/users/oauth")
        .json(&json!({ "provider": "google", "access_token": "google-token" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["data"]["username"], "nicola");
}

#[tokio::test]
async fn test_social_sign_in_errors() {
    let app = TestApp::spawn().await;

    let unsupported = app
        .post("/api/users/oauth")
        .json(&json!({ "provider": "myspace", "access_token": "token" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(unsupported).await["data"]["reason"], "provider_error");

    let missing_secret = app
        .post("/api/users/oauth")
        .json(&json!({ "provider": "twitter", "access_token": "token" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(missing_secret.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(missing_secret).await["data"]["reason"], "missing_field");

    assert_eq!(app.social_client.calls(), 0);

    let rejected = app
        .post("/api/users/oauth")
        .json(&json!({ "provider": "google", "access_token": "unknown" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(rejected).await["data"]["reason"], "credential_error");
}

#[tokio::test]
async fn test_social_sign_in_whitelisted_domains() {
    let app = TestApp::spawn_with_whitelist(vec!["example.com".to_string()]).await;
    app.social_client
        .accept("outsider", google_identity("g-3", "someone@elsewhere.org"));

    let response = app
        .post("/api/users/oauth")
        .json(&json!({ "provider": "google", "access_token": "outsider" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(response).await["data"]["reason"], "forbidden");
}

#[tokio::test]
async fn test_social_sign_in_links_signed_in_user() {
    let app = TestApp::spawn().await;
    let session = app
        .signed_in_user("nicola", "nicola@example.com", "password123")
        .await;
    app.social_client
        .accept("google-token", google_identity("g-4", "other@gmail.com"));

    let response = app
        .post("/api/users/oauth")
        .bearer_auth(&session)
        .json(&json!({ "provider": "google", "access_token": "google-token" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["data"]["username"], "nicola");
    assert!(app.repository.find_email("other@gmail.com").is_none());

    let response = app
        .post("/api/users/oauth")
        .bearer_auth("garbage")
        .json(&json!({ "provider": "google", "access_token": "google-token" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
