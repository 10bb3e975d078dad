//! Create project table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Project::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Project::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Project::Description).text().not_null())
                    .col(ColumnDef::new(Project::Category).string_len(16).not_null())
                    .col(ColumnDef::new(Project::CreatorId).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Project::Status)
                            .string_len(16)
                            .not_null()
                            .default("published"),
                    )
                    .col(
                        ColumnDef::new(Project::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Project::RepositoryLink).string_len(512))
                    .col(ColumnDef::new(Project::LiveLink).string_len(512))
                    .col(
                        ColumnDef::new(Project::VoteCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Project::AverageScore)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Project::RatingCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Project::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Project::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: category (list filter)
        manager
            .create_index(
                Index::create()
                    .name("idx_project_category")
                    .table(Project::Table)
                    .col(Project::Category)
                    .to_owned(),
            )
            .await?;

        // Index: creator_id (ownership lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_project_creator_id")
                    .table(Project::Table)
                    .col(Project::CreatorId)
                    .to_owned(),
            )
            .await?;

        // Indexes for the leaderboard orderings
        manager
            .create_index(
                Index::create()
                    .name("idx_project_vote_count")
                    .table(Project::Table)
                    .col(Project::VoteCount)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_average_score")
                    .table(Project::Table)
                    .col(Project::AverageScore)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_created_at")
                    .table(Project::Table)
                    .col(Project::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Project {
    Table,
    Id,
    Name,
    Description,
    Category,
    CreatorId,
    Status,
    IsFeatured,
    RepositoryLink,
    LiveLink,
    VoteCount,
    AverageScore,
    RatingCount,
    CreatedAt,
    UpdatedAt,
}
