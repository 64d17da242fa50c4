//! Fan-out of actions into per-recipient feed items, cleanup on removal and
//! the owner-gated feed methods.

pub mod events;

use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use socium_db::models::{Action, FeedItem};
use thiserror::Error;
use tracing::{debug, warn};

use crate::action::ActionHook;
use crate::dao::action::ActionDao;
use crate::dao::base::{DaoError, DaoResult};
use crate::dao::feed_item::FeedItemDao;

pub use events::{FeedChange, FeedEvents};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("not-authorized")]
    NotAuthorized,
    #[error("feed-item-not-found")]
    FeedItemNotFound,
    #[error("notification-not-found")]
    NotificationNotFound,
    #[error("forbidden")]
    Forbidden,
    #[error(transparent)]
    Dao(#[from] DaoError),
}

/// Recipient and initial flags of a derived feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedTarget {
    pub user_id: ObjectId,
    pub is_notification: bool,
    pub is_read: bool,
}

impl FeedTarget {
    pub fn news(user_id: ObjectId) -> Self {
        Self {
            user_id,
            is_notification: false,
            is_read: false,
        }
    }

    pub fn notification(user_id: ObjectId) -> Self {
        Self {
            user_id,
            is_notification: true,
            is_read: false,
        }
    }

    pub fn read(self) -> Self {
        Self {
            is_read: true,
            ..self
        }
    }
}

/// Builds the feed item `target` receives for `action`. Author, type and
/// timestamp are copied from the action. `None` for an action never stored.
pub fn derive_item(action: &Action, target: FeedTarget) -> Option<FeedItem> {
    Some(FeedItem {
        id: None,
        user_id: target.user_id,
        action_id: action.id?,
        author_id: action.user_id,
        action_type: action.action_type,
        created_at: action.created_at,
        is_notification: target.is_notification,
        is_read: target.is_read,
        is_mailed: false,
    })
}

pub struct FeedService {
    actions: Arc<ActionDao>,
    items: Arc<FeedItemDao>,
    events: FeedEvents,
}

impl FeedService {
    pub fn new(actions: Arc<ActionDao>, items: Arc<FeedItemDao>, events: FeedEvents) -> Self {
        Self {
            actions,
            items,
            events,
        }
    }

    pub fn events(&self) -> &FeedEvents {
        &self.events
    }

    /// Inserts the item `target` receives for `action`. Self-notifications
    /// and already existing items yield `None`.
    pub async fn insert_based_on_action(
        &self,
        action: &Action,
        target: FeedTarget,
    ) -> DaoResult<Option<FeedItem>> {
        let Some(item) = derive_item(action, target) else {
            warn!(user_id = %action.user_id, "Cannot derive feed item from unsaved action");
            return Ok(None);
        };
        self.items.insert(item).await
    }

    async fn deliver(
        &self,
        action: &Action,
        target: FeedTarget,
        touched: &mut Vec<ObjectId>,
    ) -> DaoResult<()> {
        if let Some(item) = self.insert_based_on_action(action, target).await? {
            touched.push(item.user_id);
        }
        Ok(())
    }

    /// Deletes one feed item owned by the caller.
    pub async fn remove_item(
        &self,
        viewer: Option<ObjectId>,
        feed_item_id: ObjectId,
    ) -> Result<(), FeedError> {
        let user_id = viewer.ok_or(FeedError::NotAuthorized)?;
        let item = match self.items.base.find_by_id(feed_item_id).await {
            Ok(item) => item,
            Err(DaoError::NotFound) => return Err(FeedError::FeedItemNotFound),
            Err(e) => return Err(e.into()),
        };
        if item.user_id != user_id {
            return Err(FeedError::Forbidden);
        }

        self.items.remove(feed_item_id).await?;
        self.events.publish([user_id]);
        Ok(())
    }

    /// Marks the caller's items among `ids` as read; ids of other users are ignored.
    pub async fn mark_read(
        &self,
        viewer: Option<ObjectId>,
        ids: &[ObjectId],
    ) -> Result<u64, FeedError> {
        let user_id = viewer.ok_or(FeedError::NotAuthorized)?;
        let updated = self.items.mark_read(user_id, ids).await?;
        debug!(%user_id, requested = ids.len(), updated, "Feed items marked read");
        if updated > 0 {
            self.events.publish([user_id]);
        }
        Ok(updated)
    }

    /// Deletes the caller's notification derived from `action_id`.
    pub async fn remove_notification(
        &self,
        viewer: Option<ObjectId>,
        action_id: ObjectId,
    ) -> Result<(), FeedError> {
        let user_id = viewer.ok_or(FeedError::NotAuthorized)?;
        let notification = self
            .items
            .find_notification(user_id, action_id)
            .await?
            .ok_or(FeedError::NotificationNotFound)?;

        if let Some(id) = notification.id {
            self.items.remove(id).await?;
        }
        self.events.publish([user_id]);
        Ok(())
    }
}

#[async_trait]
impl ActionHook for FeedService {
    async fn after_insert(&self, action: &Action) -> DaoResult<()> {
        let mut touched = Vec::new();

        // News for everyone subscribed to the author.
        for subscription in self.actions.subscriptions_to(action.user_id).await? {
            self.deliver(action, FeedTarget::news(subscription.user_id), &mut touched)
                .await?;
        }

        if let Some(target_id) = action.target_action_id() {
            match self.actions.base.find_by_id(target_id).await {
                Ok(target) => {
                    self.deliver(action, FeedTarget::notification(target.user_id), &mut touched)
                        .await?;
                    // Holders of the target see its replies change.
                    touched.extend(self.items.recipients_of(&[target_id]).await?);
                }
                Err(DaoError::NotFound) => {
                    warn!(%target_id, "Reply target no longer exists");
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(target_user_id) = action.target_user_id() {
            for subscription in self.actions.subscriptions_to(target_user_id).await? {
                self.deliver(
                    action,
                    FeedTarget::notification(subscription.user_id).read(),
                    &mut touched,
                )
                .await?;
            }

            for past in self.actions.by_author(target_user_id).await? {
                self.deliver(&past, FeedTarget::news(action.user_id), &mut touched)
                    .await?;
            }

            self.deliver(action, FeedTarget::notification(target_user_id), &mut touched)
                .await?;
        }

        debug!(
            action_id = ?action.id,
            action_type = action.action_type.as_str(),
            recipients = touched.len(),
            "Action fanned out"
        );
        self.events.publish(touched);
        Ok(())
    }

    async fn after_remove(&self, action: &Action) -> DaoResult<()> {
        let Some(action_id) = action.id else {
            return Ok(());
        };
        let mut touched = self.items.remove_by_action(action_id).await?;

        if let Some(target_user_id) = action.target_user_id() {
            let removed = self
                .items
                .remove_unread_news(action.user_id, target_user_id)
                .await?;
            debug!(user_id = %action.user_id, %target_user_id, removed, "Unread news dropped on unsubscribe");
            if removed > 0 {
                touched.push(action.user_id);
            }
        }

        if let Some(target_id) = action.target_action_id() {
            touched.extend(self.items.recipients_of(&[target_id]).await?);
        }

        self.events.publish(touched);
        Ok(())
    }
}
