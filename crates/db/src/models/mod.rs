pub mod action;
pub mod feed_item;
pub mod user;

pub use action::*;
pub use feed_item::*;
pub use user::*;
