use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub notification_preferences: NotificationPrefs,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPrefs {
    /// Receive unread notifications as a periodic mail digest.
    #[serde(default = "bool_true")]
    pub email: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self { email: true }
    }
}

fn bool_true() -> bool {
    true
}

impl User {
    pub const COLLECTION: &'static str = "users";
}
