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
                    .col(ColumnDef::new(Vote::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Vote::VoterId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::VotableType).string_len(16).not_null())
                    .col(ColumnDef::new(Vote::VotableId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::Direction).string_len(8).not_null())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Vote::UpdatedAt).timestamp_with_time_zone())
                    // Restrict: dropping a voter's rows would leave the cached
                    // stats on their targets stale.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_voter")
                            .from(Vote::Table, Vote::VoterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one vote per voter per votable
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_voter_votable")
                    .table(Vote::Table)
                    .col(Vote::VoterId)
                    .col(Vote::VotableType)
                    .col(Vote::VotableId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (votable_type, votable_id, direction) for the aggregator counts
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_votable_direction")
                    .table(Vote::Table)
                    .col(Vote::VotableType)
                    .col(Vote::VotableId)
                    .col(Vote::Direction)
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
    VoterId,
    VotableType,
    VotableId,
    Direction,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
