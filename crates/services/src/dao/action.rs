use bson::{doc, oid::ObjectId};
use mongodb::Database;
use socium_db::models::{Action, ActionType};

use super::base::{BaseDao, DaoResult};

pub struct ActionDao {
    pub base: BaseDao<Action>,
}

impl ActionDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Action::COLLECTION),
        }
    }

    pub async fn insert(&self, action: &Action) -> DaoResult<Action> {
        let id = self.base.insert_one(action).await?;
        self.base.find_by_id(id).await
    }

    /// The subscribe action of `user_id` towards `target_id`, if any.
    pub async fn find_subscription(
        &self,
        user_id: ObjectId,
        target_id: ObjectId,
    ) -> DaoResult<Option<Action>> {
        self.base
            .find_one(doc! {
                "action_type": ActionType::Subscribe.as_str(),
                "user_id": user_id,
                "object_id": target_id,
            })
            .await
    }

    /// All subscribe actions pointing at `target_id`, i.e. its subscribers.
    pub async fn subscriptions_to(&self, target_id: ObjectId) -> DaoResult<Vec<Action>> {
        self.base
            .find_many(
                doc! {
                    "action_type": ActionType::Subscribe.as_str(),
                    "object_id": target_id,
                },
                None,
            )
            .await
    }

    pub async fn by_author(&self, user_id: ObjectId) -> DaoResult<Vec<Action>> {
        self.base
            .find_many(doc! { "user_id": user_id }, Some(doc! { "created_at": -1 }))
            .await
    }

    pub async fn by_author_limited(&self, user_id: ObjectId, limit: u32) -> DaoResult<Vec<Action>> {
        self.base
            .find_limited(doc! { "user_id": user_id }, doc! { "created_at": -1 }, limit)
            .await
    }

    /// Comments, rates and shares that reference any of `action_ids`, oldest first.
    pub async fn replies_to_any(&self, action_ids: &[ObjectId]) -> DaoResult<Vec<Action>> {
        if action_ids.is_empty() {
            return Ok(Vec::new());
        }
        let types: Vec<&str> = ActionType::REPLIES.iter().map(|t| t.as_str()).collect();
        self.base
            .find_many(
                doc! {
                    "object_id": { "$in": action_ids },
                    "action_type": { "$in": types },
                },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    pub async fn find_rating(
        &self,
        user_id: ObjectId,
        target_id: ObjectId,
    ) -> DaoResult<Option<Action>> {
        self.base
            .find_one(doc! {
                "action_type": ActionType::Rate.as_str(),
                "user_id": user_id,
                "object_id": target_id,
            })
            .await
    }

    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> DaoResult<Vec<Action>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(doc! { "_id": { "$in": ids } }, None)
            .await
    }

    pub async fn delete(&self, action_id: ObjectId) -> DaoResult<bool> {
        self.base.delete_by_id(action_id).await
    }
}
