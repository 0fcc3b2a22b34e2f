//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    #[serde(rename = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    #[serde(rename = "admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub firstname: String,

    pub lastname: String,

    /// Lowercased at signup; unique across accounts.
    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(nullable)]
    pub mobile: Option<String>,

    /// Argon2 hash, never the plain password.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,

    /// Blocked accounts cannot authenticate.
    #[sea_orm(default_value = false)]
    pub is_blocked: bool,

    /// Single-use password reset token; cleared once redeemed.
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,

    #[sea_orm(nullable)]
    pub password_reset_expires: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session_token::Entity")]
    SessionTokens,

    #[sea_orm(has_many = "super::address::Entity")]
    Addresses,

    #[sea_orm(has_many = "super::cart::Entity")]
    Carts,

    #[sea_orm(has_many = "super::rating::Entity")]
    Ratings,

    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::session_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionTokens.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Addresses.def()
    }
}

impl Related<super::cart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Carts.def()
    }
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
