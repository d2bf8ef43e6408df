use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Users::Table)
                    .col(pk_id_col(manager, Users::Id))
                    .col(uuid_col(Users::Uuid))
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default(Expr::val("user")),
                    )
                    .col(timestamp_col(Users::CreatedAt))
                    .col(timestamp_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        unique_index(manager, "idx_users_uuid", Users::Table, Users::Uuid).await?;
        unique_index(manager, "idx_users_email", Users::Table, Users::Email).await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(EventTypes::Table)
                    .col(pk_id_col(manager, EventTypes::Id))
                    .col(uuid_col(EventTypes::Uuid))
                    .col(ColumnDef::new(EventTypes::Name).string().not_null())
                    .col(ColumnDef::new(EventTypes::Color).string().not_null())
                    .col(fk_id_nullable_col(manager, EventTypes::CreatedBy))
                    .col(timestamp_col(EventTypes::CreatedAt))
                    .col(timestamp_col(EventTypes::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_types_created_by")
                            .from(EventTypes::Table, EventTypes::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        unique_index(
            manager,
            "idx_event_types_uuid",
            EventTypes::Table,
            EventTypes::Uuid,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(TaskTypes::Table)
                    .col(pk_id_col(manager, TaskTypes::Id))
                    .col(uuid_col(TaskTypes::Uuid))
                    .col(ColumnDef::new(TaskTypes::Name).string().not_null())
                    .col(ColumnDef::new(TaskTypes::Color).string().not_null())
                    .col(fk_id_nullable_col(manager, TaskTypes::CreatedBy))
                    .col(timestamp_col(TaskTypes::CreatedAt))
                    .col(timestamp_col(TaskTypes::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_types_created_by")
                            .from(TaskTypes::Table, TaskTypes::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        unique_index(
            manager,
            "idx_task_types_uuid",
            TaskTypes::Table,
            TaskTypes::Uuid,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(CalendarEvents::Table)
                    .col(pk_id_col(manager, CalendarEvents::Id))
                    .col(uuid_col(CalendarEvents::Uuid))
                    .col(ColumnDef::new(CalendarEvents::Title).string().not_null())
                    .col(ColumnDef::new(CalendarEvents::Description).text())
                    .col(
                        ColumnDef::new(CalendarEvents::FechaInicio)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CalendarEvents::FechaFin).string().not_null())
                    .col(fk_id_col(manager, CalendarEvents::EventTypeId))
                    .col(ColumnDef::new(CalendarEvents::CustomFields).json())
                    .col(fk_id_nullable_col(manager, CalendarEvents::CreatedBy))
                    .col(timestamp_col(CalendarEvents::CreatedAt))
                    .col(timestamp_col(CalendarEvents::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_calendar_events_event_type_id")
                            .from(CalendarEvents::Table, CalendarEvents::EventTypeId)
                            .to(EventTypes::Table, EventTypes::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_calendar_events_created_by")
                            .from(CalendarEvents::Table, CalendarEvents::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        unique_index(
            manager,
            "idx_calendar_events_uuid",
            CalendarEvents::Table,
            CalendarEvents::Uuid,
        )
        .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_calendar_events_event_type_id")
                    .table(CalendarEvents::Table)
                    .col(CalendarEvents::EventTypeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(KanbanTasks::Table)
                    .col(pk_id_col(manager, KanbanTasks::Id))
                    .col(uuid_col(KanbanTasks::Uuid))
                    .col(ColumnDef::new(KanbanTasks::Title).string().not_null())
                    .col(ColumnDef::new(KanbanTasks::Description).text())
                    .col(
                        ColumnDef::new(KanbanTasks::Status)
                            .string()
                            .not_null()
                            .default(Expr::val("todo")),
                    )
                    .col(ColumnDef::new(KanbanTasks::AssignedTo).string())
                    .col(
                        ColumnDef::new(KanbanTasks::Priority)
                            .string()
                            .not_null()
                            .default(Expr::val("medium")),
                    )
                    .col(fk_id_nullable_col(manager, KanbanTasks::TaskTypeId))
                    .col(
                        ColumnDef::new(KanbanTasks::Position)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(fk_id_nullable_col(manager, KanbanTasks::CreatedBy))
                    .col(timestamp_col(KanbanTasks::CreatedAt))
                    .col(timestamp_col(KanbanTasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_kanban_tasks_task_type_id")
                            .from(KanbanTasks::Table, KanbanTasks::TaskTypeId)
                            .to(TaskTypes::Table, TaskTypes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_kanban_tasks_created_by")
                            .from(KanbanTasks::Table, KanbanTasks::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        unique_index(
            manager,
            "idx_kanban_tasks_uuid",
            KanbanTasks::Table,
            KanbanTasks::Uuid,
        )
        .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_kanban_tasks_status_position")
                    .table(KanbanTasks::Table)
                    .col(KanbanTasks::Status)
                    .col(KanbanTasks::Position)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(KanbanTasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CalendarEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaskTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EventTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

async fn unique_index<T, C>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    col: C,
) -> Result<(), DbErr>
where
    T: IntoTableRef,
    C: IntoIndexColumn,
{
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(name)
                .table(table)
                .col(col)
                .unique()
                .to_owned(),
        )
        .await
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn fk_id_nullable_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Uuid,
    Email,
    Name,
    PasswordHash,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum EventTypes {
    Table,
    Id,
    Uuid,
    Name,
    Color,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TaskTypes {
    Table,
    Id,
    Uuid,
    Name,
    Color,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CalendarEvents {
    Table,
    Id,
    Uuid,
    Title,
    Description,
    FechaInicio,
    FechaFin,
    EventTypeId,
    CustomFields,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum KanbanTasks {
    Table,
    Id,
    Uuid,
    Title,
    Description,
    Status,
    AssignedTo,
    Priority,
    TaskTypeId,
    Position,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
