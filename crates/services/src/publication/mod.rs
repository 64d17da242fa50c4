//! Read-side query compositions behind the live feed publications.
//!
//! Every publication is evaluated for a viewer. Anonymous viewers always get
//! an empty, ready result.

pub mod diff;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bson::{oid::ObjectId, DateTime, Document};
use serde::{Deserialize, Deserializer, Serialize};
use socium_config::FeedSettings;
use socium_db::models::{Action, ActionType, FeedItem, User};

use crate::dao::action::ActionDao;
use crate::dao::base::DaoResult;
use crate::dao::feed_item::FeedItemDao;
use crate::dao::user::UserDao;

pub use diff::{CollectionDiff, Keyed, diff};

/// Caller-supplied narrowing of the feed-items query. The owner filter is
/// always added on top and cannot be overridden.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedSelector {
    pub is_notification: Option<bool>,
    pub is_read: Option<bool>,
    #[serde(default, deserialize_with = "optional_object_id")]
    pub author_id: Option<ObjectId>,
    pub action_type: Option<ActionType>,
}

/// Reads an optional hex-encoded ObjectId.
pub fn optional_object_id<'de, D>(deserializer: D) -> Result<Option<ObjectId>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|hex| ObjectId::parse_str(&hex).map_err(serde::de::Error::custom))
        .transpose()
}

impl FeedSelector {
    pub fn news() -> Self {
        Self {
            is_notification: Some(false),
            ..Self::default()
        }
    }

    pub fn notifications() -> Self {
        Self {
            is_notification: Some(true),
            ..Self::default()
        }
    }

    pub fn to_filter(&self, viewer: ObjectId) -> Document {
        let mut filter = Document::new();
        if let Some(v) = self.is_notification {
            filter.insert("is_notification", v);
        }
        if let Some(v) = self.is_read {
            filter.insert("is_read", v);
        }
        if let Some(author) = self.author_id {
            filter.insert("author_id", author);
        }
        if let Some(action_type) = self.action_type {
            filter.insert("action_type", action_type.as_str());
        }
        filter.insert("user_id", viewer);
        filter
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PublicationLimits {
    pub default: u32,
    pub max: u32,
}

impl PublicationLimits {
    pub fn clamp(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.default).clamp(1, self.max.max(1))
    }
}

impl From<&FeedSettings> for PublicationLimits {
    fn from(settings: &FeedSettings) -> Self {
        Self {
            default: settings.default_limit,
            max: settings.max_limit,
        }
    }
}

/// A named publication with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Publication {
    FeedItems {
        selector: FeedSelector,
        limit: Option<u32>,
    },
    News {
        limit: Option<u32>,
    },
    Notifications {
        limit: Option<u32>,
    },
    UnreadNotifications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum PublicationName {
    #[serde(rename = "feed_items")]
    FeedItems,
    #[serde(rename = "news")]
    News,
    #[serde(rename = "notifications")]
    Notifications,
    #[serde(rename = "notifications.unread")]
    UnreadNotifications,
}

#[derive(Debug, Default, Deserialize)]
struct FeedItemsParams {
    #[serde(default)]
    selector: FeedSelector,
    limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LimitParams {
    limit: Option<u32>,
}

impl Publication {
    /// Builds a publication from its wire name and JSON parameters.
    pub fn from_parts(name: PublicationName, params: serde_json::Value) -> Result<Self, String> {
        let params = if params.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            params
        };
        let invalid = |e: serde_json::Error| format!("Invalid params: {e}");
        Ok(match name {
            PublicationName::FeedItems => {
                let p: FeedItemsParams = serde_json::from_value(params).map_err(invalid)?;
                Publication::FeedItems {
                    selector: p.selector,
                    limit: p.limit,
                }
            }
            PublicationName::News => {
                let p: LimitParams = serde_json::from_value(params).map_err(invalid)?;
                Publication::News { limit: p.limit }
            }
            PublicationName::Notifications => {
                let p: LimitParams = serde_json::from_value(params).map_err(invalid)?;
                Publication::Notifications { limit: p.limit }
            }
            PublicationName::UnreadNotifications => Publication::UnreadNotifications,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedItemView {
    pub id: String,
    pub user_id: String,
    pub action_id: String,
    pub author_id: String,
    pub action_type: ActionType,
    pub created_at: String,
    pub is_notification: bool,
    pub is_read: bool,
}

impl From<&FeedItem> for FeedItemView {
    fn from(item: &FeedItem) -> Self {
        Self {
            id: item.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: item.user_id.to_hex(),
            action_id: item.action_id.to_hex(),
            author_id: item.author_id.to_hex(),
            action_type: item.action_type,
            created_at: rfc3339(item.created_at),
            is_notification: item.is_notification,
            is_read: item.is_read,
        }
    }
}

impl Keyed for FeedItemView {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionSummary {
    pub id: String,
    pub user_id: String,
    pub action_type: ActionType,
    pub object_id: Option<String>,
    pub text: Option<String>,
    pub rating: Option<i32>,
    pub created_at: String,
}

impl From<&Action> for ActionSummary {
    fn from(action: &Action) -> Self {
        Self {
            id: action.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: action.user_id.to_hex(),
            action_type: action.action_type,
            object_id: action.object_id.map(|id| id.to_hex()),
            text: action.text.clone(),
            rating: action.rating,
            created_at: rfc3339(action.created_at),
        }
    }
}

/// An action joined with its author, its target and the replies below it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionView {
    #[serde(flatten)]
    pub action: ActionSummary,
    pub author: Option<UserSummary>,
    pub target_action: Option<ActionSummary>,
    pub target_user: Option<UserSummary>,
    pub replies: Vec<ActionSummary>,
}

impl Keyed for ActionView {
    fn key(&self) -> &str {
        &self.action.id
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct FeedPage {
    pub items: Vec<FeedItemView>,
    pub actions: Vec<ActionView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PublicationData {
    Page(FeedPage),
    Count { count: u64 },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedPageDiff {
    pub items: CollectionDiff<FeedItemView>,
    pub actions: CollectionDiff<ActionView>,
}

impl FeedPageDiff {
    pub fn between(previous: &FeedPage, next: &FeedPage) -> Self {
        Self {
            items: diff(&previous.items, &next.items),
            actions: diff(&previous.actions, &next.actions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.actions.is_empty()
    }
}

fn rfc3339(dt: DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_default()
}

pub struct PublicationService {
    items: Arc<FeedItemDao>,
    actions: Arc<ActionDao>,
    users: Arc<UserDao>,
    limits: PublicationLimits,
}

impl PublicationService {
    pub fn new(
        items: Arc<FeedItemDao>,
        actions: Arc<ActionDao>,
        users: Arc<UserDao>,
        limits: PublicationLimits,
    ) -> Self {
        Self {
            items,
            actions,
            users,
            limits,
        }
    }

    pub async fn run(
        &self,
        viewer: Option<ObjectId>,
        publication: &Publication,
    ) -> DaoResult<PublicationData> {
        Ok(match publication {
            Publication::FeedItems { selector, limit } => {
                PublicationData::Page(self.feed_items(viewer, selector, *limit).await?)
            }
            Publication::News { limit } => PublicationData::Page(self.news(viewer, *limit).await?),
            Publication::Notifications { limit } => {
                PublicationData::Page(self.notifications(viewer, *limit).await?)
            }
            Publication::UnreadNotifications => PublicationData::Count {
                count: self.unread_count(viewer).await?,
            },
        })
    }

    /// The viewer's feed items matching `selector`, newest first, joined with
    /// their source actions.
    pub async fn feed_items(
        &self,
        viewer: Option<ObjectId>,
        selector: &FeedSelector,
        limit: Option<u32>,
    ) -> DaoResult<FeedPage> {
        let Some(viewer) = viewer else {
            return Ok(FeedPage::default());
        };
        let limit = self.limits.clamp(limit);
        let items = self.items.find(selector.to_filter(viewer), limit).await?;
        self.join(items).await
    }

    pub async fn news(&self, viewer: Option<ObjectId>, limit: Option<u32>) -> DaoResult<FeedPage> {
        self.feed_items(viewer, &FeedSelector::news(), limit).await
    }

    pub async fn notifications(
        &self,
        viewer: Option<ObjectId>,
        limit: Option<u32>,
    ) -> DaoResult<FeedPage> {
        self.feed_items(viewer, &FeedSelector::notifications(), limit)
            .await
    }

    pub async fn unread_count(&self, viewer: Option<ObjectId>) -> DaoResult<u64> {
        match viewer {
            Some(user_id) => self.items.count_unread_notifications(user_id).await,
            None => Ok(0),
        }
    }

    /// Joins one action with its author, target and replies.
    pub async fn action_view(&self, action: Action) -> DaoResult<ActionView> {
        let mut views = self.join_actions(vec![action]).await?;
        Ok(views.remove(0))
    }

    /// Joins a list of actions, keeping their order.
    pub async fn action_views(&self, actions: Vec<Action>) -> DaoResult<Vec<ActionView>> {
        if actions.is_empty() {
            return Ok(Vec::new());
        }
        self.join_actions(actions).await
    }

    async fn join(&self, items: Vec<FeedItem>) -> DaoResult<FeedPage> {
        let mut action_ids: Vec<ObjectId> = Vec::new();
        for item in &items {
            if !action_ids.contains(&item.action_id) {
                action_ids.push(item.action_id);
            }
        }
        let actions = self.actions.find_by_ids(&action_ids).await?;
        let views = self.join_actions(actions).await?;
        let present: HashSet<&str> = views.iter().map(|v| v.action.id.as_str()).collect();

        // Items whose action vanished between queries are dropped.
        let items: Vec<FeedItemView> = items
            .iter()
            .map(FeedItemView::from)
            .filter(|item| present.contains(item.action_id.as_str()))
            .collect();

        let mut by_id: HashMap<String, ActionView> = views
            .into_iter()
            .map(|v| (v.action.id.clone(), v))
            .collect();
        let mut actions = Vec::new();
        for item in &items {
            if let Some(view) = by_id.remove(&item.action_id) {
                actions.push(view);
            }
        }

        Ok(FeedPage { items, actions })
    }

    async fn join_actions(&self, actions: Vec<Action>) -> DaoResult<Vec<ActionView>> {
        let ids: Vec<ObjectId> = actions.iter().filter_map(|a| a.id).collect();
        let replies = self.actions.replies_to_any(&ids).await?;
        let target_ids: Vec<ObjectId> = actions.iter().filter_map(|a| a.target_action_id()).collect();
        let targets = self.actions.find_by_ids(&target_ids).await?;

        let mut user_ids: Vec<ObjectId> = Vec::new();
        for action in actions.iter().chain(&replies).chain(&targets) {
            user_ids.push(action.user_id);
        }
        user_ids.extend(actions.iter().filter_map(|a| a.target_user_id()));
        user_ids.sort();
        user_ids.dedup();
        let users: HashMap<ObjectId, User> = self
            .users
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .filter_map(|u| u.id.map(|id| (id, u)))
            .collect();
        let targets: HashMap<ObjectId, &Action> =
            targets.iter().filter_map(|a| a.id.map(|id| (id, a))).collect();

        let views = actions
            .iter()
            .map(|action| ActionView {
                action: ActionSummary::from(action),
                author: users.get(&action.user_id).map(UserSummary::from),
                target_action: action
                    .target_action_id()
                    .and_then(|id| targets.get(&id))
                    .map(|a| ActionSummary::from(*a)),
                target_user: action
                    .target_user_id()
                    .and_then(|id| users.get(&id))
                    .map(UserSummary::from),
                replies: replies
                    .iter()
                    .filter(|r| r.object_id.is_some() && r.object_id == action.id)
                    .map(ActionSummary::from)
                    .collect(),
            })
            .collect();
        Ok(views)
    }
}
