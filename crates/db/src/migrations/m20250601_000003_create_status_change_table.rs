//! Create status change table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StatusChange::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StatusChange::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StatusChange::ToolId).string_len(32).not_null())
                    .col(ColumnDef::new(StatusChange::ChangedBy).string_len(32).not_null())
                    .col(ColumnDef::new(StatusChange::FromStatus).string_len(8).not_null())
                    .col(ColumnDef::new(StatusChange::ToStatus).string_len(8).not_null())
                    .col(ColumnDef::new(StatusChange::Comment).text())
                    .col(
                        ColumnDef::new(StatusChange::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_status_change_tool")
                            .from(StatusChange::Table, StatusChange::ToolId)
                            .to(Tool::Table, Tool::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_status_change_user")
                            .from(StatusChange::Table, StatusChange::ChangedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: tool_id (history lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_status_change_tool_id")
                    .table(StatusChange::Table)
                    .col(StatusChange::ToolId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_status_change_created_at")
                    .table(StatusChange::Table)
                    .col(StatusChange::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StatusChange::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum StatusChange {
    Table,
    Id,
    ToolId,
    ChangedBy,
    FromStatus,
    ToStatus,
    Comment,
    CreatedAt,
}

#[derive(Iden)]
enum Tool {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
