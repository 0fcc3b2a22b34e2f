//! Order entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// `Pendiente` on creation, `Procesando` once the payment is captured but
/// stock is not yet reconciled, `Pagado` after reconciliation. Admins may set
/// any status directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Pendiente")]
    Pendiente,
    #[sea_orm(string_value = "Procesando")]
    Procesando,
    #[sea_orm(string_value = "Pagado")]
    Pagado,
    #[sea_orm(string_value = "Cancelado")]
    Cancelado,
    #[sea_orm(string_value = "Enviado")]
    Enviado,
    #[sea_orm(string_value = "Completado")]
    Completado,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    /// JSON snapshot of the default address at checkout time.
    #[sea_orm(column_type = "JsonBinary")]
    pub shipping_address: Json,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,

    /// Raw payment intent payload sent to the gateway.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub payment_intent: Option<Json>,

    /// Gateway-side order ID; capture and cancel look orders up by it.
    #[sea_orm(nullable)]
    pub payment_id: Option<String>,

    pub status: OrderStatus,

    /// Set in the second capture phase once stock/sold counters are applied.
    #[sea_orm(default_value = false)]
    pub stock_reconciled: bool,

    #[sea_orm(nullable)]
    pub captured_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
