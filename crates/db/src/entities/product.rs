//! Product entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Listing state. Inactive products stay in the catalog but are not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ProductState {
    #[sea_orm(string_value = "activo")]
    #[serde(rename = "activo")]
    Activo,
    #[sea_orm(string_value = "inactivo")]
    #[serde(rename = "inactivo")]
    Inactivo,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Unique together with `brand`.
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,

    /// Image URLs (JSON array of strings).
    #[sea_orm(column_type = "JsonBinary")]
    pub images: Json,

    /// Available color variants (JSON array of strings).
    #[sea_orm(column_type = "JsonBinary")]
    pub colors: Json,

    /// Free-form tags (JSON array of strings).
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    pub category_id: String,

    pub brand: String,

    /// Units on hand; decremented when an order is captured.
    pub stock: i32,

    /// Units sold (denormalized counter).
    #[sea_orm(default_value = 0)]
    pub sold: i32,

    pub state: ProductState,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,

    #[sea_orm(has_many = "super::rating::Entity")]
    Ratings,

    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
