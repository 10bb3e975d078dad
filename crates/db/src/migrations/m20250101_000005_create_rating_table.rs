//! Create rating table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rating::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rating::UserId).string_len(128).not_null())
                    .col(ColumnDef::new(Rating::ProjectId).string_len(32).not_null())
                    .col(ColumnDef::new(Rating::CriteriaId).string_len(32).not_null())
                    .col(ColumnDef::new(Rating::Score).double().not_null())
                    .col(
                        ColumnDef::new(Rating::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Rating::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_project")
                            .from(Rating::Table, Rating::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_criteria")
                            .from(Rating::Table, Rating::CriteriaId)
                            .to(Criteria::Table, Criteria::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, project_id, criteria_id) - one score per criteria
        manager
            .create_index(
                Index::create()
                    .name("idx_rating_user_project_criteria")
                    .table(Rating::Table)
                    .col(Rating::UserId)
                    .col(Rating::ProjectId)
                    .col(Rating::CriteriaId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: project_id (for aggregating a project's scores)
        manager
            .create_index(
                Index::create()
                    .name("idx_rating_project_id")
                    .table(Rating::Table)
                    .col(Rating::ProjectId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rating::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Rating {
    Table,
    Id,
    UserId,
    ProjectId,
    CriteriaId,
    Score,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Project {
    Table,
    Id,
}

#[derive(Iden)]
enum Criteria {
    Table,
    Id,
}
