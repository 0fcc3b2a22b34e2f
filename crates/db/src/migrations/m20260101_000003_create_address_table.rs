//! Create address table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Address::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Address::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Address::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Address::AddressName).string_len(64).not_null())
                    .col(ColumnDef::new(Address::AddressLine1).string_len(256).not_null())
                    .col(ColumnDef::new(Address::AddressLine2).string_len(256))
                    .col(ColumnDef::new(Address::City).string_len(128).not_null())
                    .col(ColumnDef::new(Address::State).string_len(128).not_null())
                    .col(ColumnDef::new(Address::Country).string_len(128).not_null())
                    .col(ColumnDef::new(Address::Zipcode).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Address::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Address::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Address::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_address_user")
                            .from(Address::Table, Address::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, address_name) - one label per user
        manager
            .create_index(
                Index::create()
                    .name("idx_address_user_name")
                    .table(Address::Table)
                    .col(Address::UserId)
                    .col(Address::AddressName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (listing, default lookup)
        manager
            .create_index(
                Index::create()
                    .name("idx_address_user_id")
                    .table(Address::Table)
                    .col(Address::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Address::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Address {
    Table,
    Id,
    UserId,
    AddressName,
    AddressLine1,
    AddressLine2,
    City,
    State,
    Country,
    Zipcode,
    IsDefault,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
