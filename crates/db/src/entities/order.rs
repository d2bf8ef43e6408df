use sea_orm::entity::prelude::*;

use crate::types::OrderStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub calendar_event_id: i64,
    pub order_number: String,
    pub supplier: String,
    pub client: String,
    #[sea_orm(column_type = "Double", nullable)]
    pub amount: Option<f64>,
    pub status: OrderStatus,
    pub created_by: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
