//! Create vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::UserId).string_len(128).not_null())
                    .col(ColumnDef::new(Vote::ProjectId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_project")
                            .from(Vote::Table, Vote::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, project_id) - one vote per user per project
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_user_project")
                    .table(Vote::Table)
                    .col(Vote::UserId)
                    .col(Vote::ProjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: project_id (for counting votes on a project)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_project_id")
                    .table(Vote::Table)
                    .col(Vote::ProjectId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    UserId,
    ProjectId,
    CreatedAt,
}

#[derive(Iden)]
enum Project {
    Table,
    Id,
}
