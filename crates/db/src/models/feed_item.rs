use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::action::ActionType;

/// One recipient's view of one action. `is_notification == false` marks a
/// news item, `true` a notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub action_id: ObjectId,
    pub author_id: ObjectId,
    pub action_type: ActionType,
    pub created_at: DateTime,
    #[serde(default)]
    pub is_notification: bool,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_mailed: bool,
}

impl FeedItem {
    pub const COLLECTION: &'static str = "feeds";

    /// Recipients never get feed items about their own actions.
    pub fn is_self_notification(&self) -> bool {
        self.user_id == self.author_id
    }
}
