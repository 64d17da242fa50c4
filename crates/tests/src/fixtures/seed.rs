use bson::{Document, doc, oid::ObjectId};
use serde_json::Value;

use super::test_app::TestApp;

pub const PASSWORD: &str = "Password123!";

pub struct SeededUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl SeededUser {
    pub fn oid(&self) -> ObjectId {
        ObjectId::parse_str(&self.id).unwrap()
    }
}

impl TestApp {
    /// Register a user named `username` and return their auth info.
    pub async fn register_user(&self, username: &str) -> SeededUser {
        let email = format!("{username}@socium.test");
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "username": username,
                "display_name": username.to_uppercase(),
                "password": PASSWORD,
            }))
            .send()
            .await
            .expect("Register request failed");

        let status = resp.status().as_u16();
        let json: Value = resp.json().await.expect("Failed to parse register response");
        assert_eq!(status, 201, "Register failed: {json}");

        SeededUser {
            id: json["user"]["id"].as_str().unwrap().to_string(),
            email,
            username: username.to_string(),
            access_token: json["access_token"].as_str().unwrap().to_string(),
            refresh_token: json["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Create an authenticated request with the given token.
    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_put(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    async fn created(&self, req: reqwest::RequestBuilder) -> Value {
        let resp = req.send().await.expect("Request failed");
        let status = resp.status().as_u16();
        let json: Value = resp.json().await.expect("Failed to parse response");
        assert_eq!(status, 201, "Unexpected status {status}: {json}");
        json
    }

    /// Post a plain action and return its id.
    pub async fn create_post(&self, user: &SeededUser, text: &str) -> String {
        let json = self
            .created(
                self.auth_post("/api/action", &user.access_token)
                    .json(&serde_json::json!({ "text": text })),
            )
            .await;
        json["id"].as_str().unwrap().to_string()
    }

    pub async fn comment(&self, user: &SeededUser, action_id: &str, text: &str) -> String {
        let json = self
            .created(
                self.auth_post(&format!("/api/action/{action_id}/comment"), &user.access_token)
                    .json(&serde_json::json!({ "text": text })),
            )
            .await;
        json["id"].as_str().unwrap().to_string()
    }

    pub async fn rate(&self, user: &SeededUser, action_id: &str, value: i32) -> String {
        let json = self
            .created(
                self.auth_post(&format!("/api/action/{action_id}/rate"), &user.access_token)
                    .json(&serde_json::json!({ "value": value })),
            )
            .await;
        json["id"].as_str().unwrap().to_string()
    }

    pub async fn share(&self, user: &SeededUser, action_id: &str) -> String {
        let json = self
            .created(self.auth_post(&format!("/api/action/{action_id}/share"), &user.access_token))
            .await;
        json["id"].as_str().unwrap().to_string()
    }

    /// Toggle `user`'s subscription to `target`; returns the JSON outcome.
    pub async fn subscribe(&self, user: &SeededUser, target: &SeededUser) -> Value {
        let resp = self
            .auth_post(&format!("/api/user/{}/subscribe", target.id), &user.access_token)
            .send()
            .await
            .expect("Subscribe request failed");
        assert_eq!(resp.status().as_u16(), 200);
        resp.json().await.unwrap()
    }

    /// GET a feed publication snapshot for `user`.
    pub async fn feed(&self, user: &SeededUser, path: &str) -> Value {
        let resp = self
            .auth_get(path, &user.access_token)
            .send()
            .await
            .expect("Feed request failed");
        assert_eq!(resp.status().as_u16(), 200);
        resp.json().await.unwrap()
    }

    pub async fn unread_count(&self, user: &SeededUser) -> u64 {
        self.feed(user, "/api/feed/notifications/unread").await["count"]
            .as_u64()
            .unwrap()
    }

    /// Raw feed documents owned by `user`, straight from the database.
    pub async fn feed_docs(&self, user: &SeededUser) -> Vec<Document> {
        use futures::TryStreamExt;
        self.db
            .collection::<Document>("feeds")
            .find(doc! { "user_id": user.oid() })
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap()
    }
}

/// Items of a feed snapshot whose source is `action_id`.
pub fn items_for<'a>(snapshot: &'a Value, action_id: &str) -> Vec<&'a Value> {
    snapshot["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|i| i["action_id"] == action_id)
        .collect()
}
