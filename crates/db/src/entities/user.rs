//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user account.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator: manages users and the cleanup scheduler.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Regular member.
    #[sea_orm(string_value = "member")]
    Member,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub username_lower: String,

    /// Notification target, unique per account.
    #[sea_orm(unique)]
    pub email: String,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    pub role: UserRole,

    /// Argon2 password hash
    pub password_hash: String,

    /// Session token, cleared on logout
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Coarse lifecycle flag: false while the account sits in the
    /// deletion pipeline.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    /// Present iff the account is scheduled for permanent deletion.
    #[sea_orm(nullable)]
    pub deletion_scheduled_at: Option<DateTimeWithTimeZone>,

    /// Last reminder threshold (7, 3 or 1) already emailed for the
    /// current schedule. Cleared when the schedule changes.
    #[sea_orm(nullable)]
    pub last_reminder_days: Option<i32>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::status_change::Entity")]
    StatusChanges,
}

impl Related<super::status_change::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusChanges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
