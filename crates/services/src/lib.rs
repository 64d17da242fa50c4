pub mod action;
pub mod auth;
pub mod dao;
pub mod feed;
pub mod mail;
pub mod publication;

pub use action::{ActionHook, ActionService};
pub use auth::AuthService;
pub use dao::BaseDao;
pub use feed::{FeedEvents, FeedService};
pub use mail::DigestService;
pub use publication::PublicationService;
