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
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::VotableType).string_len(64).not_null())
                    .col(ColumnDef::new(Vote::VotableId).string_len(64).not_null())
                    .col(ColumnDef::new(Vote::VoterType).string_len(64).not_null())
                    .col(ColumnDef::new(Vote::VoterId).string_len(64).not_null())
                    .col(ColumnDef::new(Vote::Direction).boolean().not_null())
                    .col(ColumnDef::new(Vote::Comment).text())
                    .col(ColumnDef::new(Vote::FeedbackTags).json_binary().not_null())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Vote::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Unique index: one vote per (voter, votable) pair. This constraint
        // is the authoritative arbiter under concurrent first-time votes.
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_pair")
                    .table(Vote::Table)
                    .col(Vote::VoterType)
                    .col(Vote::VoterId)
                    .col(Vote::VotableType)
                    .col(Vote::VotableId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: votable side (for counts, score, listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_votable")
                    .table(Vote::Table)
                    .col(Vote::VotableType)
                    .col(Vote::VotableId)
                    .to_owned(),
            )
            .await?;

        // Index: voter side (for voter-scoped listings and purges)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_voter")
                    .table(Vote::Table)
                    .col(Vote::VoterType)
                    .col(Vote::VoterId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_created_at")
                    .table(Vote::Table)
                    .col(Vote::CreatedAt)
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
    VotableType,
    VotableId,
    VoterType,
    VoterId,
    Direction,
    Comment,
    FeedbackTags,
    CreatedAt,
    UpdatedAt,
}
