//! Create activity log table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign keys: entries are append-only and must survive the
        // deletion of the actor (and of the tool) they reference.
        manager
            .create_table(
                Table::create()
                    .table(ActivityLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLog::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityLog::ActorId).string_len(32))
                    .col(ColumnDef::new(ActivityLog::Action).string_len(32).not_null())
                    .col(ColumnDef::new(ActivityLog::ToolId).string_len(32))
                    .col(ColumnDef::new(ActivityLog::Details).text().not_null())
                    .col(
                        ColumnDef::new(ActivityLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: actor_id
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_log_actor_id")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::ActorId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_log_created_at")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ActivityLog {
    Table,
    Id,
    ActorId,
    Action,
    ToolId,
    Details,
    CreatedAt,
}
