//! Action lifecycle. Every insert and removal goes through [`ActionService`],
//! which runs the registered [`ActionHook`]s after the write succeeds.

use std::ops::RangeInclusive;
use std::sync::Arc;

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use serde::Serialize;
use socium_db::models::{Action, ActionType};
use thiserror::Error;
use tracing::{debug, info};

use crate::dao::action::ActionDao;
use crate::dao::base::DaoError;
use crate::dao::user::UserDao;

pub const RATING_RANGE: RangeInclusive<i32> = 1..=5;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action-not-found")]
    NotFound,
    #[error("user-not-found")]
    UserNotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Dao(#[from] DaoError),
}

pub type ActionResult<T> = Result<T, ActionError>;

/// Reacts to actions after they are stored or deleted.
#[async_trait]
pub trait ActionHook: Send + Sync {
    async fn after_insert(&self, action: &Action) -> Result<(), DaoError>;
    async fn after_remove(&self, action: &Action) -> Result<(), DaoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribeOutcome {
    Subscribed,
    Unsubscribed,
}

pub struct ActionService {
    actions: Arc<ActionDao>,
    users: Arc<UserDao>,
    hooks: Vec<Arc<dyn ActionHook>>,
}

impl ActionService {
    pub fn new(actions: Arc<ActionDao>, users: Arc<UserDao>) -> Self {
        Self {
            actions,
            users,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn ActionHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub async fn get(&self, action_id: ObjectId) -> ActionResult<Action> {
        self.actions
            .base
            .find_by_id(action_id)
            .await
            .map_err(not_found_as(ActionError::NotFound))
    }

    pub async fn list_by_author(&self, user_id: ObjectId, limit: u32) -> ActionResult<Vec<Action>> {
        Ok(self.actions.by_author_limited(user_id, limit).await?)
    }

    pub async fn create_post(&self, user_id: ObjectId, text: String) -> ActionResult<Action> {
        let text = non_empty_text(text)?;
        self.insert(new_action(user_id, ActionType::Default, None, Some(text), None))
            .await
    }

    pub async fn comment(
        &self,
        user_id: ObjectId,
        target_id: ObjectId,
        text: String,
    ) -> ActionResult<Action> {
        let text = non_empty_text(text)?;
        self.get(target_id).await?;
        self.insert(new_action(
            user_id,
            ActionType::Comment,
            Some(target_id),
            Some(text),
            None,
        ))
        .await
    }

    /// Rates `target_id`. A previous rating of the same action by the same
    /// user is removed first.
    pub async fn rate(&self, user_id: ObjectId, target_id: ObjectId, value: i32) -> ActionResult<Action> {
        check_rating(value)?;
        self.get(target_id).await?;

        if let Some(previous) = self.actions.find_rating(user_id, target_id).await? {
            debug!(%user_id, %target_id, "Replacing previous rating");
            self.remove_tree(previous).await?;
        }

        let inserted = self
            .insert(new_action(
                user_id,
                ActionType::Rate,
                Some(target_id),
                None,
                Some(value),
            ))
            .await;
        match inserted {
            Err(ActionError::Dao(DaoError::DuplicateKey(_))) => {
                debug!(%user_id, %target_id, "Concurrent rating already stored");
                self.actions
                    .find_rating(user_id, target_id)
                    .await?
                    .ok_or(ActionError::NotFound)
            }
            other => other,
        }
    }

    pub async fn share(&self, user_id: ObjectId, target_id: ObjectId) -> ActionResult<Action> {
        self.get(target_id).await?;
        self.insert(new_action(user_id, ActionType::Share, Some(target_id), None, None))
            .await
    }

    /// Toggles the subscription of `user_id` to `target_user_id`.
    pub async fn subscribe(
        &self,
        user_id: ObjectId,
        target_user_id: ObjectId,
    ) -> ActionResult<(SubscribeOutcome, Action)> {
        if user_id == target_user_id {
            return Err(ActionError::Validation(
                "Cannot subscribe to yourself".to_string(),
            ));
        }
        self.users
            .find_active(target_user_id)
            .await
            .map_err(not_found_as(ActionError::UserNotFound))?;

        if let Some(existing) = self.actions.find_subscription(user_id, target_user_id).await? {
            self.remove_tree(existing.clone()).await?;
            info!(%user_id, %target_user_id, "Unsubscribed");
            return Ok((SubscribeOutcome::Unsubscribed, existing));
        }

        let inserted = self
            .insert(new_action(
                user_id,
                ActionType::Subscribe,
                Some(target_user_id),
                None,
                None,
            ))
            .await;
        let action = match inserted {
            Err(ActionError::Dao(DaoError::DuplicateKey(_))) => {
                debug!(%user_id, %target_user_id, "Concurrent subscription already stored");
                self.actions
                    .find_subscription(user_id, target_user_id)
                    .await?
                    .ok_or(ActionError::UserNotFound)?
            }
            other => other?,
        };
        info!(%user_id, %target_user_id, "Subscribed");
        Ok((SubscribeOutcome::Subscribed, action))
    }

    pub async fn is_subscribed(&self, user_id: ObjectId, target_user_id: ObjectId) -> ActionResult<bool> {
        Ok(self
            .actions
            .find_subscription(user_id, target_user_id)
            .await?
            .is_some())
    }

    pub async fn subscriber_count(&self, user_id: ObjectId) -> ActionResult<usize> {
        Ok(self.actions.subscriptions_to(user_id).await?.len())
    }

    /// Removes an action authored by `user_id` together with every reply
    /// below it. Returns the number of removed actions.
    pub async fn remove(&self, user_id: ObjectId, action_id: ObjectId) -> ActionResult<usize> {
        let action = self.get(action_id).await?;
        if action.user_id != user_id {
            return Err(ActionError::Forbidden);
        }
        self.remove_tree(action).await
    }

    async fn insert(&self, action: Action) -> ActionResult<Action> {
        let stored = self.actions.insert(&action).await?;
        debug!(id = ?stored.id, action_type = stored.action_type.as_str(), "Action stored");
        for hook in &self.hooks {
            hook.after_insert(&stored).await?;
        }
        Ok(stored)
    }

    /// Deletes `root` and its replies, deepest first, running the removal
    /// hooks for each deleted action.
    async fn remove_tree(&self, root: Action) -> ActionResult<usize> {
        let mut order = vec![root];
        let mut frontier: Vec<ObjectId> = order.iter().filter_map(|a| a.id).collect();
        while !frontier.is_empty() {
            let replies = self.actions.replies_to_any(&frontier).await?;
            frontier = replies.iter().filter_map(|a| a.id).collect();
            order.extend(replies);
        }

        let mut removed = 0;
        for action in order.iter().rev() {
            let Some(id) = action.id else { continue };
            if self.actions.delete(id).await? {
                removed += 1;
                for hook in &self.hooks {
                    hook.after_remove(action).await?;
                }
            }
        }
        debug!(removed, "Action tree removed");
        Ok(removed)
    }
}

fn new_action(
    user_id: ObjectId,
    action_type: ActionType,
    object_id: Option<ObjectId>,
    text: Option<String>,
    rating: Option<i32>,
) -> Action {
    Action {
        id: None,
        user_id,
        action_type,
        object_id,
        text,
        rating,
        created_at: DateTime::now(),
    }
}

fn non_empty_text(text: String) -> ActionResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ActionError::Validation("Text must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn check_rating(value: i32) -> ActionResult<()> {
    if RATING_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(ActionError::Validation(format!(
            "Rating must be between {} and {}",
            RATING_RANGE.start(),
            RATING_RANGE.end()
        )))
    }
}

fn not_found_as(replacement: ActionError) -> impl FnOnce(DaoError) -> ActionError {
    move |e| match e {
        DaoError::NotFound => replacement,
        other => ActionError::Dao(other),
    }
}
