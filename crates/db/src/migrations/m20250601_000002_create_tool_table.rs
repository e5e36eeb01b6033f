//! Create tool table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tool::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tool::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Tool::SerialNo).string_len(64).not_null())
                    .col(ColumnDef::new(Tool::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Tool::Description).text())
                    .col(
                        ColumnDef::new(Tool::Status)
                            .string_len(8)
                            .not_null()
                            .default("green"),
                    )
                    .col(ColumnDef::new(Tool::Location).string_len(256))
                    .col(
                        ColumnDef::new(Tool::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Tool::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Unique index: serial_no
        manager
            .create_index(
                Index::create()
                    .name("idx_tool_serial_no")
                    .table(Tool::Table)
                    .col(Tool::SerialNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: status (dashboard counts filter on it)
        manager
            .create_index(
                Index::create()
                    .name("idx_tool_status")
                    .table(Tool::Table)
                    .col(Tool::Status)
                    .to_owned(),
            )
            .await?;

        // Index: created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_tool_created_at")
                    .table(Tool::Table)
                    .col(Tool::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tool::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Tool {
    Table,
    Id,
    SerialNo,
    Name,
    Description,
    Status,
    Location,
    CreatedAt,
    UpdatedAt,
}
