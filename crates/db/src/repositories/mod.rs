//! Database repositories.

mod activity_log;
mod status_change;
mod tool;
mod user;

pub use activity_log::ActivityLogRepository;
pub use status_change::StatusChangeRepository;
pub use tool::{ToolListQuery, ToolRepository};
pub use user::UserRepository;
