use mongodb::Database;
use socium_config::Settings;
use socium_services::{
    ActionService, AuthService, FeedEvents, FeedService, PublicationService,
    dao::{action::ActionDao, feed_item::FeedItemDao, user::UserDao},
    publication::PublicationLimits,
};
use std::sync::Arc;

use crate::ws::storage::WsStorage;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub feed_items: Arc<FeedItemDao>,
    pub actions: Arc<ActionService>,
    pub feed: Arc<FeedService>,
    pub publications: Arc<PublicationService>,
    pub events: FeedEvents,
    pub ws_storage: Arc<WsStorage>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let action_dao = Arc::new(ActionDao::new(&db));
        let feed_items = Arc::new(FeedItemDao::new(&db));
        let events = FeedEvents::new(settings.feed.event_buffer);

        let feed = Arc::new(FeedService::new(
            action_dao.clone(),
            feed_items.clone(),
            events.clone(),
        ));
        let actions = Arc::new(
            ActionService::new(action_dao.clone(), users.clone()).with_hook(feed.clone()),
        );
        let publications = Arc::new(PublicationService::new(
            feed_items.clone(),
            action_dao,
            users.clone(),
            PublicationLimits::from(&settings.feed),
        ));
        let ws_storage = Arc::new(WsStorage::new());

        Self {
            db,
            settings,
            auth,
            users,
            feed_items,
            actions,
            feed,
            publications,
            events,
            ws_storage,
        }
    }

    /// Applies the configured default and maximum page size.
    pub fn clamp_limit(&self, requested: Option<u32>) -> u32 {
        PublicationLimits::from(&self.settings.feed).clamp(requested)
    }
}
