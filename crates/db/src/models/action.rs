use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// A recorded social event. Feed items are derived from these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub action_type: ActionType,
    /// Target action for comment/rate/share, target user for subscribe.
    pub object_id: Option<ObjectId>,
    pub text: Option<String>,
    pub rating: Option<i32>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    #[default]
    Default,
    Comment,
    Rate,
    Share,
    Subscribe,
}

impl ActionType {
    /// Action types whose `object_id` points at another action.
    pub const REPLIES: [ActionType; 3] = [ActionType::Comment, ActionType::Rate, ActionType::Share];

    pub fn is_reply(self) -> bool {
        Self::REPLIES.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Default => "default",
            ActionType::Comment => "comment",
            ActionType::Rate => "rate",
            ActionType::Share => "share",
            ActionType::Subscribe => "subscribe",
        }
    }
}

impl Action {
    pub const COLLECTION: &'static str = "actions";

    /// The action this one replies to (comment, rate, share).
    pub fn target_action_id(&self) -> Option<ObjectId> {
        if self.action_type.is_reply() {
            self.object_id
        } else {
            None
        }
    }

    /// The user this subscribe action points at.
    pub fn target_user_id(&self) -> Option<ObjectId> {
        if self.action_type == ActionType::Subscribe {
            self.object_id
        } else {
            None
        }
    }
}
