use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::ids;
use crate::{entities::event_type, rules::EventTypeRules, types::EventCategory};

/// An event type as surfaced to callers. `category` is always resolved: rows
/// stored before categories existed get one inferred from their name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EventType {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub category: EventCategory,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CreateEventType {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub category: Option<EventCategory>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct UpdateEventType {
    pub name: Option<String>,
    pub color: Option<String>,
    pub category: Option<EventCategory>,
}

impl EventType {
    fn from_model(model: event_type::Model, rules: &EventTypeRules, created_by: Option<Uuid>) -> Self {
        Self {
            id: model.uuid,
            category: rules.resolve_category(model.category, &model.name),
            name: model.name,
            color: model.color,
            created_by,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    async fn resolve<C: ConnectionTrait>(
        db: &C,
        model: event_type::Model,
        rules: &EventTypeRules,
    ) -> Result<Self, DbErr> {
        let created_by = match model.created_by {
            Some(id) => ids::user_uuid_by_id(db, id).await?,
            None => None,
        };
        Ok(Self::from_model(model, rules, created_by))
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        rules: &EventTypeRules,
    ) -> Result<Vec<Self>, DbErr> {
        let records = event_type::Entity::find()
            .order_by_asc(event_type::Column::Name)
            .all(db)
            .await?;
        let creators =
            ids::user_uuids_by_ids(db, records.iter().filter_map(|m| m.created_by)).await?;
        Ok(records
            .into_iter()
            .map(|model| {
                let created_by = model.created_by.and_then(|id| creators.get(&id).copied());
                Self::from_model(model, rules, created_by)
            })
            .collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        rules: &EventTypeRules,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = event_type::Entity::find()
            .filter(event_type::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::resolve(db, model, rules).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_name<C: ConnectionTrait>(
        db: &C,
        rules: &EventTypeRules,
        name: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = event_type::Entity::find()
            .filter(event_type::Column::Name.eq(name))
            .order_by_asc(event_type::Column::Id)
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::resolve(db, model, rules).await?)),
            None => Ok(None),
        }
    }

    /// Name of the event type with the given row id, if it still exists.
    pub async fn name_by_row_id<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<String>, DbErr> {
        event_type::Entity::find()
            .select_only()
            .column(event_type::Column::Name)
            .filter(event_type::Column::Id.eq(id))
            .into_tuple()
            .one(db)
            .await
    }

    /// Creates an event type. A missing category is inferred from the name.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        rules: &EventTypeRules,
        data: &CreateEventType,
        created_by: Option<Uuid>,
    ) -> Result<Self, DbErr> {
        let created_by_id = match created_by {
            Some(uuid) => ids::user_id_by_uuid(db, uuid).await?,
            None => None,
        };
        let category = data
            .category
            .unwrap_or_else(|| rules.category_for(&data.name));
        let now = Utc::now();
        let active = event_type::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            name: Set(data.name.clone()),
            color: Set(data.color.clone()),
            category: Set(Some(category)),
            created_by: Set(created_by_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(
            model,
            rules,
            created_by_id.and(created_by),
        ))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        rules: &EventTypeRules,
        id: Uuid,
        data: &UpdateEventType,
    ) -> Result<Self, DbErr> {
        let record = event_type::Entity::find()
            .filter(event_type::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Event type not found".to_string()))?;

        let mut active: event_type::ActiveModel = record.into();
        if let Some(name) = data.name.clone() {
            active.name = Set(name);
        }
        if let Some(color) = data.color.clone() {
            active.color = Set(color);
        }
        if let Some(category) = data.category {
            active.category = Set(Some(category));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::resolve(db, updated, rules).await
    }

    /// Deletes an event type. Fails with a foreign key violation (see
    /// `crate::is_foreign_key_violation`) while calendar events still use it.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = event_type::Entity::delete_many()
            .filter(event_type::Column::Uuid.eq(id))
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

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn insert_legacy_row<C: ConnectionTrait>(db: &C, name: &str) {
        let now = Utc::now();
        event_type::ActiveModel {
            id: NotSet,
            uuid: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            color: Set("#000000".to_string()),
            category: Set(None),
            created_by: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn legacy_rows_get_category_from_name() {
        let db = setup_db().await;
        let rules = EventTypeRules::default();
        insert_legacy_row(&db, "Albarán").await;
        insert_legacy_row(&db, "Reunión").await;

        let all = EventType::find_all(&db, &rules).await.unwrap();
        let albaran = all.iter().find(|t| t.name == "Albarán").unwrap();
        let reunion = all.iter().find(|t| t.name == "Reunión").unwrap();
        assert_eq!(albaran.category, EventCategory::Document);
        assert_eq!(reunion.category, EventCategory::Event);
    }

    #[tokio::test]
    async fn stored_category_wins_over_inference() {
        let db = setup_db().await;
        let rules = EventTypeRules::default();
        let created = EventType::create(
            &db,
            &rules,
            &CreateEventType {
                name: "Factura".to_string(),
                color: "#10b981".to_string(),
                category: Some(EventCategory::Event),
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(created.category, EventCategory::Event);

        let inferred = EventType::create(
            &db,
            &rules,
            &CreateEventType {
                name: "Pedido".to_string(),
                color: "#3b82f6".to_string(),
                category: None,
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(inferred.category, EventCategory::Document);

        let updated = EventType::update(
            &db,
            &rules,
            created.id,
            &UpdateEventType {
                category: Some(EventCategory::Document),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.category, EventCategory::Document);
        assert_eq!(updated.name, "Factura");
    }

    #[tokio::test]
    async fn deleting_a_type_in_use_is_a_foreign_key_violation() {
        use crate::models::calendar_event::{CalendarEvent, CalendarEventRecord, CreateCalendarEvent};

        let db = setup_db().await;
        let rules = EventTypeRules::default();
        let pedido = EventType::create(
            &db,
            &rules,
            &CreateEventType {
                name: "Pedido".to_string(),
                color: "#3b82f6".to_string(),
                category: None,
            },
            None,
        )
        .await
        .unwrap();
        let row_id = ids::event_type_id_by_uuid(&db, pedido.id)
            .await
            .unwrap()
            .unwrap();
        let payload = CreateCalendarEvent {
            title: "Pedido 42".to_string(),
            fecha_inicio: "2025-03-01T09:00".to_string(),
            fecha_fin: "2025-03-01T10:00".to_string(),
            ..Default::default()
        };
        CalendarEvent::create(
            &db,
            &CalendarEventRecord::from_payload(&payload, row_id, None),
            None,
        )
        .await
        .unwrap();

        let err = EventType::delete(&db, pedido.id).await.unwrap_err();
        assert!(crate::is_foreign_key_violation(&err), "unexpected error: {err:?}");
        assert!(!crate::is_unique_violation(&err));
        assert!(
            EventType::find_by_id(&db, &rules, pedido.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn name_lookup_by_row_id() {
        let db = setup_db().await;
        insert_legacy_row(&db, "Pedido").await;
        let row_id = ids::event_type_id_by_uuid(
            &db,
            EventType::find_by_name(&db, &EventTypeRules::default(), "Pedido")
                .await
                .unwrap()
                .unwrap()
                .id,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(
            EventType::name_by_row_id(&db, row_id).await.unwrap().as_deref(),
            Some("Pedido")
        );
        assert_eq!(EventType::name_by_row_id(&db, row_id + 1).await.unwrap(), None);
    }
}
