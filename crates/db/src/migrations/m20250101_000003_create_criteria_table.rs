//! Create criteria table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Criteria::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Criteria::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Criteria::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Criteria::Description).text().not_null())
                    .col(
                        ColumnDef::new(Criteria::Weight)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .col(
                        ColumnDef::new(Criteria::ProjectCategory)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Criteria::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (name, project_category) - makes seeding idempotent
        manager
            .create_index(
                Index::create()
                    .name("idx_criteria_name_category")
                    .table(Criteria::Table)
                    .col(Criteria::Name)
                    .col(Criteria::ProjectCategory)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Criteria::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Criteria {
    Table,
    Id,
    Name,
    Description,
    Weight,
    ProjectCategory,
    CreatedAt,
}
