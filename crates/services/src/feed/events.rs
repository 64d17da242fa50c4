use bson::oid::ObjectId;
use tokio::sync::broadcast;
use tracing::trace;

/// Something in `user_id`'s feed changed; live publications of that user re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedChange {
    pub user_id: ObjectId,
}

#[derive(Clone)]
pub struct FeedEvents {
    tx: broadcast::Sender<FeedChange>,
}

impl FeedEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedChange> {
        self.tx.subscribe()
    }

    /// Publishes one change per distinct user. Having no listeners is not an error.
    pub fn publish<I>(&self, user_ids: I)
    where
        I: IntoIterator<Item = ObjectId>,
    {
        let mut seen = Vec::new();
        for user_id in user_ids {
            if seen.contains(&user_id) {
                continue;
            }
            seen.push(user_id);
            let receivers = self.tx.send(FeedChange { user_id }).unwrap_or(0);
            trace!(%user_id, receivers, "Feed change published");
        }
    }
}
