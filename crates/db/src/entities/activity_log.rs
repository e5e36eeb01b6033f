//! Activity log entity.
//!
//! Append-only record of user and system actions. Entries are never
//! updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    #[sea_orm(string_value = "create")]
    Create,
    #[sea_orm(string_value = "update")]
    Update,
    #[sea_orm(string_value = "delete")]
    Delete,
    #[sea_orm(string_value = "report")]
    Report,
    /// Admin scheduled an account for deletion.
    #[sea_orm(string_value = "admin_schedule_deletion")]
    AdminScheduleDeletion,
    /// Admin restored an account out of the deletion pipeline.
    #[sea_orm(string_value = "admin_restore_user")]
    AdminRestoreUser,
    /// Admin triggered an out-of-band cleanup run.
    #[sea_orm(string_value = "admin_run_cleanup")]
    AdminRunCleanup,
    /// Scheduler permanently removed an account.
    #[sea_orm(string_value = "system_permanent_deletion")]
    SystemPermanentDeletion,
    /// Scheduler sent a day-threshold reminder.
    #[sea_orm(string_value = "system_deletion_reminder")]
    SystemDeletionReminder,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// NULL for scheduler-originated entries.
    #[sea_orm(nullable, indexed)]
    pub actor_id: Option<String>,

    pub action: ActivityAction,

    /// Subject tool, when the action concerns one.
    #[sea_orm(nullable)]
    pub tool_id: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub details: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
