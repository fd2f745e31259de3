pub mod auth;
pub mod cors;
pub mod request_id;

pub use auth::{AdminUser, AuthUser};
