//! Database entities.

pub mod activity_log;
pub mod status_change;
pub mod tool;
pub mod user;

pub use activity_log::Entity as ActivityLog;
pub use status_change::Entity as StatusChange;
pub use tool::Entity as Tool;
pub use user::Entity as User;
