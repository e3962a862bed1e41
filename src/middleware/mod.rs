pub mod auth;
pub mod request_id;

pub use auth::{issue_token, AdminUser, AuthUser, Claims};
pub use request_id::RequestId;
