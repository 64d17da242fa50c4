use crate::fixtures::test_app::TestApp;
use serde_json::Value;
use socium_db::models::{Action, ActionType};
use socium_services::action::SubscribeOutcome;
use socium_services::dao::{action::ActionDao, base::DaoError};

#[tokio::test]
async fn create_and_get_action() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;

    let post = app.create_post(&x, "  trimmed  ").await;

    let resp = app.anon_get(&format!("/api/action/{post}")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["text"], "trimmed");
    assert_eq!(json["action_type"], "default");
    assert_eq!(json["author"]["username"], "xavier");
}

#[tokio::test]
async fn empty_post_is_rejected() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;

    let resp = app
        .auth_post("/api/action", &x.access_token)
        .json(&serde_json::json!({ "text": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn replies_need_an_existing_target() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let missing = bson::oid::ObjectId::new().to_hex();

    let resp = app
        .auth_post(&format!("/api/action/{missing}/share"), &x.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "action-not-found");
}

#[tokio::test]
async fn rating_is_bounded_and_replaced() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    let post = app.create_post(&x, "rate me").await;

    let resp = app
        .auth_post(&format!("/api/action/{post}/rate"), &y.access_token)
        .json(&serde_json::json!({ "value": 6 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let first = app.rate(&y, &post, 2).await;
    let second = app.rate(&y, &post, 4).await;
    assert_ne!(first, second);

    let resp = app.anon_get(&format!("/api/action/{post}")).send().await.unwrap();
    let json: Value = resp.json().await.unwrap();
    let replies = json["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["rating"], 4);

    // Only the surviving rating is notified.
    assert_eq!(app.unread_count(&x).await, 1);
}

#[tokio::test]
async fn only_the_author_can_remove() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    let post = app.create_post(&x, "mine").await;

    let resp = app
        .auth_delete(&format!("/api/action/{post}"), &y.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_delete(&format!("/api/action/{post}"), &x.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app.anon_get(&format!("/api/action/{post}")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn removal_cascades_through_nested_replies() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    let post = app.create_post(&x, "root").await;
    let comment = app.comment(&y, &post, "child").await;
    app.share(&x, &comment).await;

    let resp = app
        .auth_delete(&format!("/api/action/{post}"), &x.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["removed"], 3);

    assert!(app.feed_docs(&x).await.is_empty());
    assert!(app.feed_docs(&y).await.is_empty());
}

#[tokio::test]
async fn cannot_subscribe_to_yourself() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;

    let resp = app
        .auth_post(&format!("/api/user/{}/subscribe", x.id), &x.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn user_profile_and_listing() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    app.subscribe(&y, &x).await;
    app.create_post(&x, "one").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    app.create_post(&x, "two").await;

    let resp = app.auth_get(&format!("/api/user/{}", x.id), &y.access_token).send().await.unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["username"], "xavier");
    assert_eq!(json["subscriber_count"], 1);
    assert_eq!(json["is_subscribed"], true);
    assert!(json.get("email").is_none());

    let resp = app.anon_get(&format!("/api/user/{}/action", x.id)).send().await.unwrap();
    let actions: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0]["text"], "two");

    let resp = app.anon_get("/api/user?limit=1").send().await.unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["items"][0]["username"], "yvonne");

    let resp = app
        .anon_get(&format!("/api/user/{}", bson::oid::ObjectId::new().to_hex()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

fn stored_action(user_id: bson::oid::ObjectId, action_type: ActionType, object_id: bson::oid::ObjectId) -> Action {
    Action {
        id: None,
        user_id,
        action_type,
        object_id: Some(object_id),
        text: Some("again".to_string()),
        rating: (action_type == ActionType::Rate).then_some(3),
        created_at: bson::DateTime::now(),
    }
}

#[tokio::test]
async fn one_subscription_and_one_rating_per_target() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    let post = bson::oid::ObjectId::parse_str(app.create_post(&x, "unique").await).unwrap();
    let dao = ActionDao::new(&app.db);

    for (action_type, target) in [(ActionType::Subscribe, x.oid()), (ActionType::Rate, post)] {
        dao.insert(&stored_action(y.oid(), action_type, target)).await.unwrap();
        let second = dao.insert(&stored_action(y.oid(), action_type, target)).await;
        assert!(
            matches!(second, Err(DaoError::DuplicateKey(_))),
            "second {} should be rejected",
            action_type.as_str()
        );
    }

    // Comments and shares repeat freely.
    for action_type in [ActionType::Comment, ActionType::Share] {
        dao.insert(&stored_action(y.oid(), action_type, post)).await.unwrap();
        dao.insert(&stored_action(y.oid(), action_type, post)).await.unwrap();
    }
}

#[tokio::test]
async fn concurrent_subscribes_store_at_most_one_subscription() {
    let app = TestApp::spawn().await;
    let x = app.register_user("xavier").await;
    let y = app.register_user("yvonne").await;
    let actions = app.state.actions.clone();

    let (first, second) = tokio::join!(
        actions.subscribe(y.oid(), x.oid()),
        actions.subscribe(y.oid(), x.oid()),
    );
    first.unwrap();
    second.unwrap();

    let stored = app
        .db
        .collection::<bson::Document>("actions")
        .count_documents(bson::doc! {
            "action_type": "subscribe",
            "user_id": y.oid(),
            "object_id": x.oid(),
        })
        .await
        .unwrap();
    assert!(stored <= 1);
    assert_eq!(actions.is_subscribed(y.oid(), x.oid()).await.unwrap(), stored == 1);

    // The next toggle always lands on a consistent state.
    let (outcome, _) = actions.subscribe(y.oid(), x.oid()).await.unwrap();
    let expected = if stored == 1 {
        SubscribeOutcome::Unsubscribed
    } else {
        SubscribeOutcome::Subscribed
    };
    assert_eq!(outcome, expected);
    assert_eq!(actions.subscriber_count(x.oid()).await.unwrap(), 1 - stored as usize);
}
