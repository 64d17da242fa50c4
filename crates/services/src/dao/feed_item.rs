use bson::{doc, oid::ObjectId, Document};
use mongodb::Database;
use socium_db::models::FeedItem;
use tracing::debug;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct FeedItemDao {
    pub base: BaseDao<FeedItem>,
}

impl FeedItemDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, FeedItem::COLLECTION),
        }
    }

    /// Stores a feed item. Self-notifications and duplicates of an existing
    /// (user, action, kind) item are skipped and yield `None`.
    pub async fn insert(&self, item: FeedItem) -> DaoResult<Option<FeedItem>> {
        if item.is_self_notification() {
            debug!(user_id = %item.user_id, action_id = %item.action_id, "Skipping self-notification");
            return Ok(None);
        }

        match self.base.insert_one(&item).await {
            Ok(id) => Ok(Some(FeedItem { id: Some(id), ..item })),
            Err(DaoError::DuplicateKey(_)) => {
                debug!(user_id = %item.user_id, action_id = %item.action_id, "Feed item already exists");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find(&self, filter: Document, limit: u32) -> DaoResult<Vec<FeedItem>> {
        self.base
            .find_limited(filter, doc! { "created_at": -1, "_id": -1 }, limit)
            .await
    }

    /// Distinct recipients holding an item for any of the given actions.
    pub async fn recipients_of(&self, action_ids: &[ObjectId]) -> DaoResult<Vec<ObjectId>> {
        if action_ids.is_empty() {
            return Ok(Vec::new());
        }
        let values = self
            .base
            .collection()
            .distinct("user_id", doc! { "action_id": { "$in": action_ids } })
            .await?;
        Ok(values.into_iter().filter_map(|v| v.as_object_id()).collect())
    }

    /// Deletes every item derived from `action_id`; returns the affected recipients.
    pub async fn remove_by_action(&self, action_id: ObjectId) -> DaoResult<Vec<ObjectId>> {
        let recipients = self.recipients_of(&[action_id]).await?;
        let deleted = self.base.hard_delete(doc! { "action_id": action_id }).await?;
        debug!(%action_id, deleted, "Removed feed items of action");
        Ok(recipients)
    }

    /// Deletes the unread news `user_id` received from `author_id`.
    pub async fn remove_unread_news(&self, user_id: ObjectId, author_id: ObjectId) -> DaoResult<u64> {
        self.base
            .hard_delete(doc! {
                "user_id": user_id,
                "author_id": author_id,
                "is_notification": false,
                "is_read": false,
            })
            .await
    }

    pub async fn remove(&self, feed_item_id: ObjectId) -> DaoResult<bool> {
        self.base.delete_by_id(feed_item_id).await
    }

    pub async fn find_notification(
        &self,
        user_id: ObjectId,
        action_id: ObjectId,
    ) -> DaoResult<Option<FeedItem>> {
        self.base
            .find_one(doc! {
                "user_id": user_id,
                "action_id": action_id,
                "is_notification": true,
            })
            .await
    }

    /// Flags the given items read, restricted to those owned by `user_id`.
    pub async fn mark_read(&self, user_id: ObjectId, ids: &[ObjectId]) -> DaoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.base
            .update_many(
                doc! { "_id": { "$in": ids }, "user_id": user_id },
                doc! { "$set": { "is_read": true } },
            )
            .await
    }

    pub async fn count_unread_notifications(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base
            .count(doc! { "user_id": user_id, "is_notification": true, "is_read": false })
            .await
    }

    pub async fn unmailed_notifications(&self) -> DaoResult<Vec<FeedItem>> {
        self.base
            .find_many(
                doc! { "is_notification": true, "is_read": false, "is_mailed": false },
                Some(doc! { "user_id": 1, "created_at": -1 }),
            )
            .await
    }

    pub async fn mark_mailed(&self, ids: &[ObjectId]) -> DaoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.base
            .update_many(
                doc! { "_id": { "$in": ids } },
                doc! { "$set": { "is_mailed": true } },
            )
            .await
    }
}
