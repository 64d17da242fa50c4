pub mod action;
pub mod auth;
pub mod feed;
pub mod notification;
pub mod user;
