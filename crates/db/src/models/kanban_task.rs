use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::serde_ext::empty_string_as_none;
use uuid::Uuid;

use super::ids;
use crate::{
    entities::kanban_task,
    types::{KanbanStatus, TaskPriority},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KanbanTask {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: KanbanStatus,
    pub assigned_to: Option<String>,
    pub priority: TaskPriority,
    pub task_type_id: Option<Uuid>,
    pub position: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct CreateKanbanTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub task_type_id: Option<Uuid>,
    #[serde(default)]
    pub position: Option<i32>,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct UpdateKanbanTask {
    pub status: Option<KanbanStatus>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub assigned_to: Option<String>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub task_type_id: Option<Uuid>,
    pub position: Option<i32>,
}

impl UpdateKanbanTask {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.assigned_to.is_none()
            && self.priority.is_none()
            && self.task_type_id.is_none()
            && self.position.is_none()
    }
}

impl KanbanTask {
    async fn from_models<C: ConnectionTrait>(
        db: &C,
        models: Vec<kanban_task::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let task_types =
            ids::task_type_uuids_by_ids(db, models.iter().filter_map(|m| m.task_type_id)).await?;
        let creators = ids::user_uuids_by_ids(db, models.iter().filter_map(|m| m.created_by)).await?;
        Ok(models
            .into_iter()
            .map(|model| Self {
                id: model.uuid,
                title: model.title,
                description: model.description,
                status: model.status,
                assigned_to: model.assigned_to,
                priority: model.priority,
                task_type_id: model.task_type_id.and_then(|id| task_types.get(&id).copied()),
                position: model.position,
                created_by: model.created_by.and_then(|id| creators.get(&id).copied()),
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            })
            .collect())
    }

    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: kanban_task::Model,
    ) -> Result<Self, DbErr> {
        let mut tasks = Self::from_models(db, vec![model]).await?;
        tasks
            .pop()
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))
    }

    async fn task_type_row_id<C: ConnectionTrait>(
        db: &C,
        task_type_id: Uuid,
    ) -> Result<i64, DbErr> {
        ids::task_type_id_by_uuid(db, task_type_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task type not found".to_string()))
    }

    /// All tasks grouped by column, each column in board order.
    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = kanban_task::Entity::find()
            .order_by_asc(kanban_task::Column::Status)
            .order_by_asc(kanban_task::Column::Position)
            .order_by_asc(kanban_task::Column::Id)
            .all(db)
            .await?;
        Self::from_models(db, records).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = kanban_task::Entity::find()
            .filter(kanban_task::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateKanbanTask,
        created_by: Option<Uuid>,
    ) -> Result<Self, DbErr> {
        let task_type_id = match data.task_type_id {
            Some(uuid) => Some(Self::task_type_row_id(db, uuid).await?),
            None => None,
        };
        let created_by = match created_by {
            Some(uuid) => ids::user_id_by_uuid(db, uuid).await?,
            None => None,
        };
        let now = Utc::now();
        let active = kanban_task::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            status: Set(KanbanStatus::Todo),
            assigned_to: Set(data.assigned_to.clone()),
            priority: Set(data.priority),
            task_type_id: Set(task_type_id),
            position: Set(data.position.unwrap_or(0)),
            created_by: Set(created_by),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateKanbanTask,
    ) -> Result<Self, DbErr> {
        let record = kanban_task::Entity::find()
            .filter(kanban_task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let mut active: kanban_task::ActiveModel = record.into();
        if let Some(status) = data.status {
            active.status = Set(status);
        }
        if let Some(title) = data.title.clone() {
            active.title = Set(title);
        }
        if let Some(description) = data.description.clone() {
            active.description = Set(Some(description));
        }
        if let Some(assigned_to) = data.assigned_to.clone() {
            active.assigned_to = Set(Some(assigned_to));
        }
        if let Some(priority) = data.priority {
            active.priority = Set(priority);
        }
        if let Some(task_type_id) = data.task_type_id {
            active.task_type_id = Set(Some(Self::task_type_row_id(db, task_type_id).await?));
        }
        if let Some(position) = data.position {
            active.position = Set(position);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = kanban_task::Entity::delete_many()
            .filter(kanban_task::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
