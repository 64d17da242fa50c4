use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use socium_db::models::{NotificationPrefs, User};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

/// Fields a user may change on their own profile. `None` leaves the field as is.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub about: Option<String>,
    pub notify_by_email: Option<bool>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        email: String,
        username: String,
        display_name: String,
        password_hash: String,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email,
            username,
            display_name,
            avatar: None,
            about: None,
            password_hash: Some(password_hash),
            notification_preferences: NotificationPrefs::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_active(&self, user_id: ObjectId) -> DaoResult<User> {
        self.base
            .find_one(doc! { "_id": user_id, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_username(&self, username: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "username": username, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> DaoResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(doc! { "_id": { "$in": ids } }, None)
            .await
    }

    /// Most recently registered users, newest first.
    pub async fn recent(&self, limit: u32) -> DaoResult<Vec<User>> {
        self.base
            .find_limited(doc! { "deleted_at": null }, doc! { "created_at": -1 }, limit)
            .await
    }

    pub async fn count_active(&self) -> DaoResult<u64> {
        self.base.count(doc! { "deleted_at": null }).await
    }

    pub async fn update_profile(&self, user_id: ObjectId, profile: ProfileUpdate) -> DaoResult<bool> {
        let mut update = bson::Document::new();
        if let Some(name) = profile.display_name {
            update.insert("display_name", name);
        }
        if let Some(av) = profile.avatar {
            update.insert("avatar", av);
        }
        if let Some(about) = profile.about {
            update.insert("about", about);
        }
        if let Some(email) = profile.notify_by_email {
            update.insert("notification_preferences.email", email);
        }

        if update.is_empty() {
            return Ok(false);
        }

        self.base
            .update_by_id(user_id, doc! { "$set": update })
            .await
    }
}
