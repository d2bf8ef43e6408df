use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::ids;
use crate::entities::event_link;

/// An explicit association between an order and a calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EventLink {
    pub id: Uuid,
    pub order_id: Uuid,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CreateEventLink {
    pub order_id: Uuid,
    pub event_id: Uuid,
}

impl EventLink {
    pub async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: event_link::Model,
    ) -> Result<Self, DbErr> {
        let order_id = ids::order_uuid_by_id(db, model.order_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Order not found".to_string()))?;
        let event_id = ids::calendar_event_uuid_by_id(db, model.event_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Event not found".to_string()))?;
        Ok(Self {
            id: model.uuid,
            order_id,
            event_id,
            created_at: model.created_at.into(),
        })
    }

    pub async fn find_model_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<event_link::Model>, DbErr> {
        event_link::Entity::find()
            .filter(event_link::Column::Uuid.eq(id))
            .one(db)
            .await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        order_id: i64,
        event_id: i64,
    ) -> Result<event_link::Model, DbErr> {
        let active = event_link::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            event_id: Set(event_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        active.insert(db).await
    }

    /// Row ids of the events linked to an order, oldest link first.
    pub async fn event_ids_for_order<C: ConnectionTrait>(
        db: &C,
        order_id: i64,
    ) -> Result<Vec<i64>, DbErr> {
        event_link::Entity::find()
            .select_only()
            .column(event_link::Column::EventId)
            .filter(event_link::Column::OrderId.eq(order_id))
            .order_by_asc(event_link::Column::Id)
            .into_tuple()
            .all(db)
            .await
    }

    pub async fn count_for_event<C: ConnectionTrait>(db: &C, event_id: i64) -> Result<u64, DbErr> {
        event_link::Entity::find()
            .filter(event_link::Column::EventId.eq(event_id))
            .count(db)
            .await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = event_link::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }

    /// Removes every link that points at the given event.
    pub async fn delete_for_event<C: ConnectionTrait>(db: &C, event_id: i64) -> Result<u64, DbErr> {
        let result = event_link::Entity::delete_many()
            .filter(event_link::Column::EventId.eq(event_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
