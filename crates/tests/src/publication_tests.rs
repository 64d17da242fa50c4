use crate::fixtures::{seed::items_for, test_app::TestApp};
use serde_json::Value;

#[tokio::test]
async fn anonymous_viewer_gets_empty_ready_results() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    app.subscribe(&y, &x).await;
    app.create_post(&x, "private to subscribers").await;

    for path in ["/api/feed", "/api/feed/news", "/api/feed/notifications"] {
        let resp = app.anon_get(path).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 200, "{path}");
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["ready"], true);
        assert_eq!(json["items"].as_array().unwrap().len(), 0);
        assert_eq!(json["actions"].as_array().unwrap().len(), 0);
    }

    let resp = app
        .anon_get("/api/feed/notifications/unread")
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json, serde_json::json!({ "ready": true, "count": 0 }));
}

#[tokio::test]
async fn feed_is_newest_first_and_limited() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    app.subscribe(&y, &x).await;

    let mut posts = Vec::new();
    for n in 0..5 {
        posts.push(app.create_post(&x, &format!("post {n}")).await);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let news = app.feed(&y, "/api/feed/news?limit=3").await;
    let ids: Vec<&str> = news["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["action_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![posts[4].as_str(), posts[3].as_str(), posts[2].as_str()]);

    // A zero limit is clamped up to one.
    let news = app.feed(&y, "/api/feed/news?limit=0").await;
    assert_eq!(news["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn selector_narrows_but_never_widens() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    app.subscribe(&y, &x).await;
    let post = app.create_post(&x, "hello").await;
    app.comment(&y, &post, "hi back").await;

    // y sees only their own news item, even when asking for x's author_id.
    let feed = app
        .feed(&y, &format!("/api/feed?author_id={}", x.id))
        .await;
    let items = feed["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.iter().all(|i| i["user_id"] == y.id.as_str()));

    let comments = app
        .feed(&x, "/api/feed?is_notification=true&action_type=comment")
        .await;
    let items = comments["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["action_type"], "comment");

    let resp = app
        .auth_get("/api/feed?author_id=zzz", &x.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn items_are_joined_with_their_actions() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    app.subscribe(&y, &x).await;
    let post = app.create_post(&x, "joined").await;
    app.comment(&x, &post, "first reply").await;
    app.rate(&x, &post, 4).await;

    let news = app.feed(&y, "/api/feed/news").await;
    assert_eq!(items_for(&news, &post).len(), 1);

    let action = news["actions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == post.as_str())
        .expect("post joined");
    assert_eq!(action["text"], "joined");
    assert_eq!(action["author"]["username"], "xavier");
    assert_eq!(action["replies"].as_array().unwrap().len(), 2);

    let comment = news["actions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["action_type"] == "comment")
        .expect("comment joined");
    assert_eq!(comment["target_action"]["id"], post.as_str());
}

#[tokio::test]
async fn subscribe_action_is_joined_with_target_user() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    let outcome = app.subscribe(&y, &x).await;
    let action_id = outcome["action_id"].as_str().unwrap();

    let notes = app.feed(&x, "/api/feed/notifications").await;
    let action = notes["actions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == action_id)
        .expect("subscribe joined");
    assert_eq!(action["author"]["username"], "yvonne");
    assert_eq!(action["target_user"]["username"], "xavier");
}
