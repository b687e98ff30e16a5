//! Create story table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Story::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Story::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Story::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Story::Title).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Story::Slug)
                            .string_len(256)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Story::Body).text().not_null())
                    .col(ColumnDef::new(Story::UpvoteCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Story::DownvoteCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Story::VoteCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Story::VoteScore).double().not_null().default(0.0))
                    .col(
                        ColumnDef::new(Story::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Story::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_author")
                            .from(Story::Table, Story::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: author_id (for listing a user's stories)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_author_id")
                    .table(Story::Table)
                    .col(Story::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Index: vote_score (for top stories)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_vote_score")
                    .table(Story::Table)
                    .col(Story::VoteScore)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Story::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
    AuthorId,
    Title,
    Slug,
    Body,
    UpvoteCount,
    DownvoteCount,
    VoteCount,
    VoteScore,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
