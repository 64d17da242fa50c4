pub mod auth;
pub mod path_id;

pub use auth::{AuthUser, MaybeAuthUser};
pub use path_id::PathId;
