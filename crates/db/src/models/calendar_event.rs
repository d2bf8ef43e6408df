use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;
use utils::serde_ext::empty_string_as_none;
use uuid::Uuid;

use super::{ids, order::OrderDetails};
use crate::entities::calendar_event;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub event_type_id: Uuid,
    pub custom_fields: Option<Value>,
    pub created_by: Option<Uuid>,
    pub order_number: Option<String>,
    pub client: Option<String>,
    pub supplier: Option<String>,
    pub amount: Option<f64>,
    pub linked_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of both create and update requests. An update replaces every field.
/// Blank strings in the order fields are stored as null.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct CreateCalendarEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub event_type_id: Uuid,
    #[serde(default)]
    pub custom_fields: Option<Value>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub order_number: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub client: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub supplier: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub linked_order_id: Option<Uuid>,
}

pub type UpdateCalendarEvent = CreateCalendarEvent;

/// A calendar event row with its foreign keys already resolved to row ids.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalendarEventRecord {
    pub title: String,
    pub description: Option<String>,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub event_type_id: i64,
    pub custom_fields: Option<Value>,
    pub order_number: Option<String>,
    pub client: Option<String>,
    pub supplier: Option<String>,
    pub amount: Option<f64>,
    pub linked_order_id: Option<i64>,
}

impl CalendarEventRecord {
    /// Builds a record from a request body, normalising blank strings the
    /// deserializer could not see (e.g. values built in code).
    pub fn from_payload(
        payload: &CreateCalendarEvent,
        event_type_id: i64,
        linked_order_id: Option<i64>,
    ) -> Self {
        Self {
            title: payload.title.clone(),
            description: payload.description.clone(),
            fecha_inicio: payload.fecha_inicio.clone(),
            fecha_fin: payload.fecha_fin.clone(),
            event_type_id,
            custom_fields: payload.custom_fields.clone(),
            order_number: non_blank(payload.order_number.as_deref()),
            client: non_blank(payload.client.as_deref()),
            supplier: non_blank(payload.supplier.as_deref()),
            amount: payload.amount,
            linked_order_id,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Order columns copied from an event. Absent text becomes an empty string.
pub fn order_details(model: &calendar_event::Model) -> OrderDetails {
    OrderDetails {
        order_number: model.order_number.clone().unwrap_or_default(),
        supplier: model.supplier.clone().unwrap_or_default(),
        client: model.client.clone().unwrap_or_default(),
        amount: model.amount,
    }
}

impl CalendarEvent {
    pub async fn from_models<C: ConnectionTrait>(
        db: &C,
        models: Vec<calendar_event::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let event_types =
            ids::event_type_uuids_by_ids(db, models.iter().map(|m| m.event_type_id)).await?;
        let creators = ids::user_uuids_by_ids(db, models.iter().filter_map(|m| m.created_by)).await?;
        let orders =
            ids::order_uuids_by_ids(db, models.iter().filter_map(|m| m.linked_order_id)).await?;

        models
            .into_iter()
            .map(|model| {
                let event_type_id = event_types.get(&model.event_type_id).copied().ok_or_else(
                    || DbErr::RecordNotFound(format!("Event type {} not found", model.event_type_id)),
                )?;
                Ok(Self {
                    id: model.uuid,
                    title: model.title,
                    description: model.description,
                    fecha_inicio: model.fecha_inicio,
                    fecha_fin: model.fecha_fin,
                    event_type_id,
                    custom_fields: model.custom_fields,
                    created_by: model.created_by.and_then(|id| creators.get(&id).copied()),
                    order_number: model.order_number,
                    client: model.client,
                    supplier: model.supplier,
                    amount: model.amount,
                    linked_order_id: model
                        .linked_order_id
                        .and_then(|id| orders.get(&id).copied()),
                    created_at: model.created_at.into(),
                    updated_at: model.updated_at.into(),
                })
            })
            .collect()
    }

    pub async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: calendar_event::Model,
    ) -> Result<Self, DbErr> {
        let mut events = Self::from_models(db, vec![model]).await?;
        events
            .pop()
            .ok_or(DbErr::RecordNotFound("Event not found".to_string()))
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = calendar_event::Entity::find()
            .order_by_asc(calendar_event::Column::FechaInicio)
            .order_by_asc(calendar_event::Column::Id)
            .all(db)
            .await?;
        Self::from_models(db, records).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        match Self::find_model_by_id(db, id).await? {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_model_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<calendar_event::Model>, DbErr> {
        calendar_event::Entity::find()
            .filter(calendar_event::Column::Uuid.eq(id))
            .one(db)
            .await
    }

    pub async fn find_model_by_row_id<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<calendar_event::Model>, DbErr> {
        calendar_event::Entity::find_by_id(id).one(db).await
    }

    /// Rows with the given ids, in ascending id order.
    pub async fn find_models_by_row_ids<C: ConnectionTrait>(
        db: &C,
        ids: Vec<i64>,
    ) -> Result<Vec<calendar_event::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        calendar_event::Entity::find()
            .filter(calendar_event::Column::Id.is_in(ids))
            .order_by_asc(calendar_event::Column::Id)
            .all(db)
            .await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        record: &CalendarEventRecord,
        created_by: Option<i64>,
    ) -> Result<calendar_event::Model, DbErr> {
        let now = Utc::now();
        let active = calendar_event::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            title: Set(record.title.clone()),
            description: Set(record.description.clone()),
            fecha_inicio: Set(record.fecha_inicio.clone()),
            fecha_fin: Set(record.fecha_fin.clone()),
            event_type_id: Set(record.event_type_id),
            custom_fields: Set(record.custom_fields.clone()),
            created_by: Set(created_by),
            order_number: Set(record.order_number.clone()),
            client: Set(record.client.clone()),
            supplier: Set(record.supplier.clone()),
            amount: Set(record.amount),
            linked_order_id: Set(record.linked_order_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        active.insert(db).await
    }

    /// Replaces every editable column of an existing row.
    pub async fn replace<C: ConnectionTrait>(
        db: &C,
        existing: calendar_event::Model,
        record: &CalendarEventRecord,
    ) -> Result<calendar_event::Model, DbErr> {
        let mut active: calendar_event::ActiveModel = existing.into();
        active.title = Set(record.title.clone());
        active.description = Set(record.description.clone());
        active.fecha_inicio = Set(record.fecha_inicio.clone());
        active.fecha_fin = Set(record.fecha_fin.clone());
        active.event_type_id = Set(record.event_type_id);
        active.custom_fields = Set(record.custom_fields.clone());
        active.order_number = Set(record.order_number.clone());
        active.client = Set(record.client.clone());
        active.supplier = Set(record.supplier.clone());
        active.amount = Set(record.amount);
        active.linked_order_id = Set(record.linked_order_id);
        active.updated_at = Set(Utc::now().into());
        active.update(db).await
    }

    pub async fn set_linked_order<C: ConnectionTrait>(
        db: &C,
        id: i64,
        linked_order_id: Option<i64>,
    ) -> Result<u64, DbErr> {
        let result = calendar_event::Entity::update_many()
            .col_expr(
                calendar_event::Column::LinkedOrderId,
                Expr::value(linked_order_id),
            )
            .col_expr(calendar_event::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(calendar_event::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Clears `linked_order_id` on every event pointing at the given order.
    pub async fn unlink_order<C: ConnectionTrait>(db: &C, order_id: i64) -> Result<u64, DbErr> {
        let result = calendar_event::Entity::update_many()
            .col_expr(
                calendar_event::Column::LinkedOrderId,
                Expr::value(Option::<i64>::None),
            )
            .col_expr(calendar_event::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(calendar_event::Column::LinkedOrderId.eq(order_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = calendar_event::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}
