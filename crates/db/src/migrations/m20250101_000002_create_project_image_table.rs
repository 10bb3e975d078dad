//! Create project_image table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProjectImage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectImage::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectImage::ProjectId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProjectImage::Image).string_len(512).not_null())
                    .col(ColumnDef::new(ProjectImage::Url).string_len(1024).not_null())
                    .col(ColumnDef::new(ProjectImage::Caption).string_len(256))
                    .col(
                        ColumnDef::new(ProjectImage::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProjectImage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_image_project")
                            .from(ProjectImage::Table, ProjectImage::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (project_id, sort_order) for gallery listing
        manager
            .create_index(
                Index::create()
                    .name("idx_project_image_project_order")
                    .table(ProjectImage::Table)
                    .col(ProjectImage::ProjectId)
                    .col(ProjectImage::SortOrder)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectImage::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ProjectImage {
    Table,
    Id,
    ProjectId,
    Image,
    Url,
    Caption,
    SortOrder,
    CreatedAt,
}

#[derive(Iden)]
enum Project {
    Table,
    Id,
}
