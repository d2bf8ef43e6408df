use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::ids;
use crate::entities::task_type;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaskType {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CreateTaskType {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct UpdateTaskType {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl TaskType {
    fn from_model(model: task_type::Model, created_by: Option<Uuid>) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            color: model.color,
            created_by,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = task_type::Entity::find()
            .order_by_asc(task_type::Column::Name)
            .all(db)
            .await?;
        let creators =
            ids::user_uuids_by_ids(db, records.iter().filter_map(|m| m.created_by)).await?;
        Ok(records
            .into_iter()
            .map(|model| {
                let created_by = model.created_by.and_then(|id| creators.get(&id).copied());
                Self::from_model(model, created_by)
            })
            .collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task_type::Entity::find()
            .filter(task_type::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => {
                let created_by = match model.created_by {
                    Some(id) => ids::user_uuid_by_id(db, id).await?,
                    None => None,
                };
                Ok(Some(Self::from_model(model, created_by)))
            }
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTaskType,
        created_by: Option<Uuid>,
    ) -> Result<Self, DbErr> {
        let created_by_id = match created_by {
            Some(uuid) => ids::user_id_by_uuid(db, uuid).await?,
            None => None,
        };
        let now = Utc::now();
        let active = task_type::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            name: Set(data.name.clone()),
            color: Set(data.color.clone()),
            created_by: Set(created_by_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, created_by_id.and(created_by)))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateTaskType,
    ) -> Result<Self, DbErr> {
        let record = task_type::Entity::find()
            .filter(task_type::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task type not found".to_string()))?;

        let created_by = match record.created_by {
            Some(row_id) => ids::user_uuid_by_id(db, row_id).await?,
            None => None,
        };
        let mut active: task_type::ActiveModel = record.into();
        if let Some(name) = data.name.clone() {
            active.name = Set(name);
        }
        if let Some(color) = data.color.clone() {
            active.color = Set(color);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated, created_by))
    }

    /// Deletes a task type; kanban tasks using it fall back to no type.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = task_type::Entity::delete_many()
            .filter(task_type::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
