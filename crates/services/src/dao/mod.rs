pub mod action;
pub mod base;
pub mod feed_item;
pub mod user;

pub use base::BaseDao;
