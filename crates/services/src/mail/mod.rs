//! Periodic digest of unread notifications, sent by mail.

mod smtp;

pub use smtp::SmtpMailer;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bson::oid::ObjectId;
use socium_db::models::{ActionType, FeedItem, User};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dao::base::DaoError;
use crate::dao::feed_item::FeedItemDao;
use crate::dao::user::UserDao;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
    #[error(transparent)]
    Dao(#[from] DaoError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Writes digests to the log instead of delivering them. Used when no SMTP
/// relay is configured.
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, body = %message.body, "Mail digest");
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DigestReport {
    pub mailed_users: usize,
    pub skipped_users: usize,
    pub marked_items: u64,
}

pub struct DigestService {
    items: Arc<FeedItemDao>,
    users: Arc<UserDao>,
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl DigestService {
    pub fn new(
        items: Arc<FeedItemDao>,
        users: Arc<UserDao>,
        mailer: Arc<dyn Mailer>,
        from: String,
    ) -> Self {
        Self {
            items,
            users,
            mailer,
            from,
        }
    }

    /// Mails every recipient their pending notifications once and flags them
    /// mailed. Opted-out recipients are flagged without a mail. A failed
    /// delivery leaves that recipient's items for the next run.
    pub async fn run_once(&self) -> Result<DigestReport, MailError> {
        let pending = self.items.unmailed_notifications().await?;
        if pending.is_empty() {
            return Ok(DigestReport::default());
        }

        let mut per_user: BTreeMap<ObjectId, Vec<FeedItem>> = BTreeMap::new();
        for item in pending {
            per_user.entry(item.user_id).or_default().push(item);
        }

        let mut lookup_ids: Vec<ObjectId> = per_user.keys().copied().collect();
        lookup_ids.extend(per_user.values().flatten().map(|i| i.author_id));
        lookup_ids.sort();
        lookup_ids.dedup();
        let users: HashMap<ObjectId, User> = self
            .users
            .find_by_ids(&lookup_ids)
            .await?
            .into_iter()
            .filter_map(|u| u.id.map(|id| (id, u)))
            .collect();

        let mut report = DigestReport::default();
        for (user_id, items) in per_user {
            let ids: Vec<ObjectId> = items.iter().filter_map(|i| i.id).collect();
            let Some(recipient) = users.get(&user_id) else {
                debug!(%user_id, "Recipient gone; flagging notifications mailed");
                report.marked_items += self.items.mark_mailed(&ids).await?;
                report.skipped_users += 1;
                continue;
            };

            if !recipient.notification_preferences.email || recipient.deleted_at.is_some() {
                report.marked_items += self.items.mark_mailed(&ids).await?;
                report.skipped_users += 1;
                continue;
            }

            let message = MailMessage {
                from: self.from.clone(),
                to: recipient.email.clone(),
                subject: format!("You have {} unread notification(s)", items.len()),
                body: compose_body(&items, &users),
            };
            match self.mailer.send(message).await {
                Ok(()) => {
                    report.marked_items += self.items.mark_mailed(&ids).await?;
                    report.mailed_users += 1;
                }
                Err(e) => warn!(%user_id, %e, "Digest delivery failed"),
            }
        }

        info!(
            mailed = report.mailed_users,
            skipped = report.skipped_users,
            items = report.marked_items,
            "Mail digest run finished"
        );
        Ok(report)
    }

    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    warn!(%e, "Mail digest run failed");
                }
            }
        })
    }
}

fn describe(action_type: ActionType) -> &'static str {
    match action_type {
        ActionType::Default => "posted",
        ActionType::Comment => "commented on your post",
        ActionType::Rate => "rated your post",
        ActionType::Share => "shared your post",
        ActionType::Subscribe => "subscribed to you",
    }
}

fn compose_body(items: &[FeedItem], users: &HashMap<ObjectId, User>) -> String {
    items
        .iter()
        .map(|item| {
            let who = users
                .get(&item.author_id)
                .map(|u| format!("@{}", u.username))
                .unwrap_or_else(|| "Someone".to_string());
            format!("- {} {}", who, describe(item.action_type))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
