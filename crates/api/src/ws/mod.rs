pub mod dispatcher;
pub mod handler;
pub mod message;
pub mod storage;
