use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{calendar_event, event_link, event_type, kanban_task, order, task_type, user};

pub async fn user_id_by_uuid<C: ConnectionTrait>(db: &C, uuid: Uuid) -> Result<Option<i64>, DbErr> {
    user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .filter(user::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn user_uuid_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Uuid>, DbErr> {
    user::Entity::find()
        .select_only()
        .column(user::Column::Uuid)
        .filter(user::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

/// Resolves several row ids of one table in a single query. Ids with no row
/// are absent from the map.
async fn uuids_by_ids<C, E>(
    db: &C,
    id_column: E::Column,
    uuid_column: E::Column,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, Uuid>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut ids: Vec<i64> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, Uuid)> = E::find()
        .select_only()
        .column(id_column)
        .column(uuid_column)
        .filter(id_column.is_in(ids))
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

pub async fn user_uuids_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, Uuid>, DbErr> {
    uuids_by_ids::<C, user::Entity>(db, user::Column::Id, user::Column::Uuid, ids).await
}

pub async fn event_type_uuids_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, Uuid>, DbErr> {
    uuids_by_ids::<C, event_type::Entity>(
        db,
        event_type::Column::Id,
        event_type::Column::Uuid,
        ids,
    )
    .await
}

pub async fn task_type_uuids_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, Uuid>, DbErr> {
    uuids_by_ids::<C, task_type::Entity>(db, task_type::Column::Id, task_type::Column::Uuid, ids)
        .await
}

pub async fn calendar_event_uuids_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, Uuid>, DbErr> {
    uuids_by_ids::<C, calendar_event::Entity>(
        db,
        calendar_event::Column::Id,
        calendar_event::Column::Uuid,
        ids,
    )
    .await
}

pub async fn order_uuids_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, Uuid>, DbErr> {
    uuids_by_ids::<C, order::Entity>(db, order::Column::Id, order::Column::Uuid, ids).await
}

pub async fn event_type_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    event_type::Entity::find()
        .select_only()
        .column(event_type::Column::Id)
        .filter(event_type::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn event_type_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    event_type::Entity::find()
        .select_only()
        .column(event_type::Column::Uuid)
        .filter(event_type::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn task_type_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    task_type::Entity::find()
        .select_only()
        .column(task_type::Column::Id)
        .filter(task_type::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn task_type_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    task_type::Entity::find()
        .select_only()
        .column(task_type::Column::Uuid)
        .filter(task_type::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn calendar_event_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    calendar_event::Entity::find()
        .select_only()
        .column(calendar_event::Column::Id)
        .filter(calendar_event::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn calendar_event_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    calendar_event::Entity::find()
        .select_only()
        .column(calendar_event::Column::Uuid)
        .filter(calendar_event::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn order_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    order::Entity::find()
        .select_only()
        .column(order::Column::Id)
        .filter(order::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn order_uuid_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Uuid>, DbErr> {
    order::Entity::find()
        .select_only()
        .column(order::Column::Uuid)
        .filter(order::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn event_link_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    event_link::Entity::find()
        .select_only()
        .column(event_link::Column::Id)
        .filter(event_link::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn kanban_task_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    kanban_task::Entity::find()
        .select_only()
        .column(kanban_task::Column::Id)
        .filter(kanban_task::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use crate::models::user::{CreateUser, User};
    use crate::types::UserRole;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn user_ids_roundtrip_and_batch_resolution() {
        let db = setup_db().await;

        let ana = User::create(
            &db,
            &CreateUser {
                email: "ana@example.com".to_string(),
                name: "Ana".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::User,
            },
        )
        .await
        .unwrap();

        let row_id = user_id_by_uuid(&db, ana.id)
            .await
            .unwrap()
            .expect("user row id");
        assert_eq!(user_uuid_by_id(&db, row_id).await.unwrap(), Some(ana.id));
        assert_eq!(user_id_by_uuid(&db, Uuid::new_v4()).await.unwrap(), None);

        let map = user_uuids_by_ids(&db, [row_id, row_id, row_id + 100])
            .await
            .unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&row_id), Some(&ana.id));

        assert!(user_uuids_by_ids(&db, []).await.unwrap().is_empty());
    }
}
