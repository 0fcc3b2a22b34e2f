//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_user_table;
mod m20260101_000002_create_session_token_table;
mod m20260101_000003_create_address_table;
mod m20260101_000004_create_category_table;
mod m20260101_000005_create_product_table;
mod m20260101_000006_create_rating_table;
mod m20260101_000007_create_cart_tables;
mod m20260101_000008_create_order_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_user_table::Migration),
            Box::new(m20260101_000002_create_session_token_table::Migration),
            Box::new(m20260101_000003_create_address_table::Migration),
            Box::new(m20260101_000004_create_category_table::Migration),
            Box::new(m20260101_000005_create_product_table::Migration),
            Box::new(m20260101_000006_create_rating_table::Migration),
            Box::new(m20260101_000007_create_cart_tables::Migration),
            Box::new(m20260101_000008_create_order_tables::Migration),
        ]
    }
}
