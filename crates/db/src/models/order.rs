use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::ids;
use crate::{entities::order, types::OrderStatus};

/// A shadow order derived from a qualifying calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: Uuid,
    pub calendar_event_id: Uuid,
    pub order_number: String,
    pub supplier: String,
    pub client: String,
    pub amount: Option<f64>,
    pub status: OrderStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns copied from the originating event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderDetails {
    pub order_number: String,
    pub supplier: String,
    pub client: String,
    pub amount: Option<f64>,
}

impl Order {
    /// Converts rows, resolving their foreign keys in batch.
    pub async fn from_models<C: ConnectionTrait>(
        db: &C,
        models: Vec<order::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let events =
            ids::calendar_event_uuids_by_ids(db, models.iter().map(|m| m.calendar_event_id))
                .await?;
        let creators = ids::user_uuids_by_ids(db, models.iter().filter_map(|m| m.created_by)).await?;

        models
            .into_iter()
            .map(|model| {
                let calendar_event_id =
                    events.get(&model.calendar_event_id).copied().ok_or_else(|| {
                        DbErr::RecordNotFound(format!(
                            "Calendar event {} not found",
                            model.calendar_event_id
                        ))
                    })?;
                Ok(Self {
                    id: model.uuid,
                    calendar_event_id,
                    order_number: model.order_number,
                    supplier: model.supplier,
                    client: model.client,
                    amount: model.amount,
                    status: model.status,
                    created_by: model.created_by.and_then(|id| creators.get(&id).copied()),
                    created_at: model.created_at.into(),
                    updated_at: model.updated_at.into(),
                })
            })
            .collect()
    }

    pub async fn from_model<C: ConnectionTrait>(db: &C, model: order::Model) -> Result<Self, DbErr> {
        let mut orders = Self::from_models(db, vec![model]).await?;
        orders
            .pop()
            .ok_or(DbErr::RecordNotFound("Order not found".to_string()))
    }

    /// Orders in the given status, newest first.
    pub async fn find_by_status<C: ConnectionTrait>(
        db: &C,
        status: OrderStatus,
    ) -> Result<Vec<Self>, DbErr> {
        let records = order::Entity::find()
            .filter(order::Column::Status.eq(status))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
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
    ) -> Result<Option<order::Model>, DbErr> {
        order::Entity::find()
            .filter(order::Column::Uuid.eq(id))
            .one(db)
            .await
    }

    pub async fn find_model_by_row_id<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<order::Model>, DbErr> {
        order::Entity::find_by_id(id).one(db).await
    }

    /// The shadow order spawned by the given event, if any.
    pub async fn find_model_by_event<C: ConnectionTrait>(
        db: &C,
        calendar_event_id: i64,
    ) -> Result<Option<order::Model>, DbErr> {
        order::Entity::find()
            .filter(order::Column::CalendarEventId.eq(calendar_event_id))
            .one(db)
            .await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        calendar_event_id: i64,
        details: &OrderDetails,
        created_by: Option<i64>,
    ) -> Result<order::Model, DbErr> {
        let now = Utc::now();
        let active = order::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            calendar_event_id: Set(calendar_event_id),
            order_number: Set(details.order_number.clone()),
            supplier: Set(details.supplier.clone()),
            client: Set(details.client.clone()),
            amount: Set(details.amount),
            status: Set(OrderStatus::Active),
            created_by: Set(created_by),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        active.insert(db).await
    }

    /// Overwrites the copied columns of the event's shadow order. Status is
    /// left alone.
    pub async fn update_details_for_event<C: ConnectionTrait>(
        db: &C,
        calendar_event_id: i64,
        details: &OrderDetails,
    ) -> Result<u64, DbErr> {
        let result = order::Entity::update_many()
            .col_expr(
                order::Column::OrderNumber,
                Expr::value(details.order_number.clone()),
            )
            .col_expr(order::Column::Supplier, Expr::value(details.supplier.clone()))
            .col_expr(order::Column::Client, Expr::value(details.client.clone()))
            .col_expr(order::Column::Amount, Expr::value(details.amount))
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::CalendarEventId.eq(calendar_event_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn set_status<C: ConnectionTrait>(
        db: &C,
        id: i64,
        status: OrderStatus,
    ) -> Result<u64, DbErr> {
        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(status))
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveValue::NotSet, Database};
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::entities::{calendar_event, event_type};

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn insert_event<C: ConnectionTrait>(db: &C) -> calendar_event::Model {
        let now = Utc::now();
        let event_type = event_type::ActiveModel {
            id: NotSet,
            uuid: Set(Uuid::new_v4()),
            name: Set("Pedido".to_string()),
            color: Set("#3b82f6".to_string()),
            category: Set(None),
            created_by: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await
        .unwrap();

        calendar_event::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            title: Set("Pedido 1".to_string()),
            description: Set(None),
            fecha_inicio: Set("2025-03-01T09:00".to_string()),
            fecha_fin: Set("2025-03-01T10:00".to_string()),
            event_type_id: Set(event_type.id),
            custom_fields: Set(None),
            created_by: Set(None),
            order_number: Set(None),
            client: Set(None),
            supplier: Set(None),
            amount: Set(None),
            linked_order_id: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    fn details(number: &str) -> OrderDetails {
        OrderDetails {
            order_number: number.to_string(),
            supplier: "X".to_string(),
            client: "Acme".to_string(),
            amount: Some(12.5),
        }
    }

    #[tokio::test]
    async fn one_order_per_event() {
        let db = setup_db().await;
        let event = insert_event(&db).await;

        Order::create(&db, event.id, &details("PED-1"), None)
            .await
            .unwrap();
        let err = Order::create(&db, event.id, &details("PED-2"), None)
            .await
            .unwrap_err();
        assert!(crate::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn status_filter_and_detail_update() {
        let db = setup_db().await;
        let event = insert_event(&db).await;
        let model = Order::create(&db, event.id, &details("PED-1"), None)
            .await
            .unwrap();

        let active = Order::find_by_status(&db, OrderStatus::Active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].calendar_event_id, event.uuid);

        Order::update_details_for_event(&db, event.id, &details("PED-9"))
            .await
            .unwrap();
        assert_eq!(
            Order::set_status(&db, model.id, OrderStatus::Deleted)
                .await
                .unwrap(),
            1
        );

        assert!(
            Order::find_by_status(&db, OrderStatus::Active)
                .await
                .unwrap()
                .is_empty()
        );
        let reloaded = Order::find_by_id(&db, model.uuid).await.unwrap().unwrap();
        assert_eq!(reloaded.order_number, "PED-9");
        assert_eq!(reloaded.status, OrderStatus::Deleted);
    }

    #[tokio::test]
    async fn deleting_event_cascades_to_order() {
        let db = setup_db().await;
        let event = insert_event(&db).await;
        let model = Order::create(&db, event.id, &details("PED-1"), None)
            .await
            .unwrap();

        calendar_event::Entity::delete_by_id(event.id)
            .exec(&db)
            .await
            .unwrap();
        assert!(Order::find_model_by_row_id(&db, model.id).await.unwrap().is_none());
    }
}
