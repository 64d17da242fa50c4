use crate::fixtures::{seed::PASSWORD, test_app::TestApp};
use serde_json::Value;

#[tokio::test]
async fn register_creates_user_and_returns_tokens() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "alice@test.com",
            "username": "alice",
            "display_name": "Alice",
            "password": "Password123!",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 201);
    assert!(resp.headers().get("set-cookie").is_some());

    let json: Value = resp.json().await.unwrap();
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["user"]["email"], "alice@test.com");
    assert_eq!(json["user"]["username"], "alice");
    assert_eq!(json["user"]["notify_by_email"], true);
}

#[tokio::test]
async fn register_rejects_invalid_payload() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "not-an-email",
            "username": "al",
            "display_name": "Al",
            "password": "short",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn register_duplicate_email_fails() {
    let app = TestApp::spawn().await;
    app.register_user("dupe").await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "dupe@socium.test",
            "username": "other",
            "display_name": "Other",
            "password": PASSWORD,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn login_with_username_or_email() {
    let app = TestApp::spawn().await;
    let user = app.register_user("carol").await;

    for login in ["carol", user.email.as_str()] {
        let body = serde_json::json!({ "login": login, "password": PASSWORD });
        let resp = app
            .client
            .post(app.url("/api/auth/login"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200, "login as {login}");
        assert!(resp.headers().contains_key("set-cookie"));
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["user"]["id"], user.id.as_str());
    }
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = TestApp::spawn().await;
    app.register_user("dave").await;

    let resp = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({ "login": "dave", "password": "WrongPassword!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    // Unknown accounts fail the same way.
    let resp = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({ "login": "nobody@socium.test", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Invalid credentials");
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let app = TestApp::spawn().await;
    let user = app.register_user("erin").await;

    let resp = app.auth_get("/api/auth/me", &user.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["username"], "erin");

    let resp = app.anon_get("/api/auth/me").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "not-authorized");

    let resp = app.auth_get("/api/auth/me", "garbage").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn refresh_token_cannot_be_used_as_access_token() {
    let app = TestApp::spawn().await;
    let user = app.register_user("frank").await;

    let resp = app
        .auth_get("/api/auth/me", &user.refresh_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app
        .client
        .post(app.url("/api/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": user.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let fresh = json["access_token"].as_str().unwrap();

    let resp = app.auth_get("/api/auth/me", fresh).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn update_profile_changes_preferences() {
    let app = TestApp::spawn().await;
    let user = app.register_user("gina").await;

    let resp = app
        .auth_put("/api/auth/me", &user.access_token)
        .json(&serde_json::json!({
            "display_name": "Gina G",
            "about": "Hello there",
            "notify_by_email": false,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["display_name"], "Gina G");
    assert_eq!(json["about"], "Hello there");
    assert_eq!(json["notify_by_email"], false);
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::spawn().await;

    let resp = app.anon_get("/health").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["ws_connections"], 0);
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let app = TestApp::spawn().await;
    app.register_user("frank").await;

    let resp = app.client.post(app.url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let cookie = resp.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(cookie.starts_with("access_token=;"));
    assert!(cookie.contains("Max-Age=0"));

    let resp = app.client.get(app.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}
