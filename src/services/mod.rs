mod auth_session;
mod chat_session;
pub mod navigation;
mod permissions;

pub use auth_session::AuthSession;
pub use chat_session::ChatSession;
pub use navigation::{visible_sections, Section};
pub use permissions::PermissionEvaluator;
