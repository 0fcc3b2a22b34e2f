//! Create session token table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SessionToken::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionToken::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SessionToken::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(SessionToken::Token)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(SessionToken::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionToken::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_token_user")
                            .from(SessionToken::Table, SessionToken::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (revoke-all, listing sessions)
        manager
            .create_index(
                Index::create()
                    .name("idx_session_token_user_id")
                    .table(SessionToken::Table)
                    .col(SessionToken::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: expires_at (expired-token purge)
        manager
            .create_index(
                Index::create()
                    .name("idx_session_token_expires_at")
                    .table(SessionToken::Table)
                    .col(SessionToken::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SessionToken::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SessionToken {
    Table,
    Id,
    UserId,
    Token,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
