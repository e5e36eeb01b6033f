//! Tool entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Condition tag of a tool.
///
/// The four colors follow the yard's physical tagging scheme: red
/// (out of service), yellow (needs attention), green (serviceable),
/// white (in transit / not yet inspected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    #[sea_orm(string_value = "red")]
    Red,
    #[sea_orm(string_value = "yellow")]
    Yellow,
    #[sea_orm(string_value = "green")]
    Green,
    #[sea_orm(string_value = "white")]
    White,
}

impl ToolStatus {
    /// Stable string form, matching the stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::White => "white",
        }
    }

    /// Parse a stored/user-supplied status value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "red" => Some(Self::Red),
            "yellow" => Some(Self::Yellow),
            "green" => Some(Self::Green),
            "white" => Some(Self::White),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tool")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Stamped serial number, unique across the yard.
    #[sea_orm(unique)]
    pub serial_no: String,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub status: ToolStatus,

    /// Free-text location (rig, rack, truck).
    #[sea_orm(nullable)]
    pub location: Option<String>,

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
