pub mod health;
pub mod sessions;

pub use health::{config, health};
pub use sessions::{create_session, logout, record_activity, session_status};
