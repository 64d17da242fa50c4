use crate::fixtures::{seed::items_for, test_app::TestApp};
use bson::oid::ObjectId;
use serde_json::Value;

#[tokio::test]
async fn session_cookie_authenticates_feed_methods() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    // Registered last, so the shared client carries yvonne's session cookie.
    let y = app.register_user("yvonne").await;
    app.subscribe(&y, &x).await;
    let post = app.create_post(&x, "hi").await;

    let news = app.feed(&y, "/api/feed/news").await;
    let item_id = items_for(&news, &post)[0]["id"].as_str().unwrap().to_string();

    let resp = app
        .client
        .delete(app.url(&format!("/api/feed/{item_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = reqwest::Client::new()
        .delete(app.url(&format!("/api/feed/{}", ObjectId::new().to_hex())))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "not-authorized");
}

#[tokio::test]
async fn remove_feed_item_failure_modes() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    app.subscribe(&y, &x).await;
    let post = app.create_post(&x, "hi").await;
    let news = app.feed(&y, "/api/feed/news").await;
    let item_id = items_for(&news, &post)[0]["id"].as_str().unwrap().to_string();

    let resp = app
        .auth_delete(&format!("/api/feed/{item_id}"), &x.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "forbidden");

    let resp = app
        .auth_delete(
            &format!("/api/feed/{}", ObjectId::new().to_hex()),
            &y.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "feed-item-not-found");

    let resp = app
        .auth_delete(&format!("/api/feed/{item_id}"), &y.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let news = app.feed(&y, "/api/feed/news").await;
    assert!(items_for(&news, &post).is_empty());
}

#[tokio::test]
async fn mark_read_only_touches_own_items() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    let post = app.create_post(&x, "hello").await;
    let comment = app.comment(&y, &post, "hey").await;
    app.subscribe(&x, &y).await;
    let second = app.comment(&y, &post, "again").await;

    let notes = app.feed(&x, "/api/feed/notifications").await;
    let x_item = items_for(&notes, &comment)[0]["id"].as_str().unwrap().to_string();
    let y_notes = app.feed(&y, "/api/feed/notifications").await;
    let y_item = y_notes["items"][0]["id"].as_str().unwrap().to_string();

    // x also owns a news item for `second`; only the named ids change.
    let resp = app
        .auth_post("/api/feed/read", &x.access_token)
        .json(&serde_json::json!({ "ids": [x_item, y_item] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["updated"], 1);

    let notes = app.feed(&x, "/api/feed/notifications").await;
    assert_eq!(items_for(&notes, &comment)[0]["is_read"], true);
    assert_eq!(items_for(&notes, &second)[0]["is_read"], false);

    let y_notes = app.feed(&y, "/api/feed/notifications").await;
    assert_eq!(y_notes["items"][0]["is_read"], false);
}

#[tokio::test]
async fn mark_read_requires_authentication() {
    let app = TestApp::spawn().await;

    let resp = reqwest::Client::new()
        .post(app.url("/api/feed/read"))
        .json(&serde_json::json!({ "ids": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn remove_notification_by_action() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    let post = app.create_post(&x, "hello").await;
    let comment = app.comment(&y, &post, "hey").await;
    assert_eq!(app.unread_count(&x).await, 1);

    let resp = app
        .auth_delete(&format!("/api/notification/{post}"), &x.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "notification-not-found");

    let resp = app
        .auth_delete(&format!("/api/notification/{comment}"), &x.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(app.unread_count(&x).await, 0);

    let resp = reqwest::Client::new()
        .delete(app.url(&format!("/api/notification/{comment}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn invalid_ids_are_bad_requests() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;

    let resp = app
        .auth_delete("/api/feed/not-an-id", &x.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = app
        .auth_post("/api/feed/read", &x.access_token)
        .json(&serde_json::json!({ "ids": ["nope"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}
