use sea_orm_migration::{prelude::*, sea_orm::DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Orders::Table)
                    .col(pk_id_col(manager, Orders::Id))
                    .col(ColumnDef::new(Orders::Uuid).uuid().not_null())
                    .col(fk_id_col(manager, Orders::CalendarEventId))
                    .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                    .col(ColumnDef::new(Orders::Supplier).string().not_null())
                    .col(ColumnDef::new(Orders::Client).string().not_null())
                    .col(ColumnDef::new(Orders::Amount).double())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("active")),
                    )
                    .col(fk_id_nullable_col(manager, Orders::CreatedBy))
                    .col(timestamp_col(Orders::CreatedAt))
                    .col(timestamp_col(Orders::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_calendar_event_id")
                            .from(Orders::Table, Orders::CalendarEventId)
                            .to(CalendarEvents::Table, CalendarEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_created_by")
                            .from(Orders::Table, Orders::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_uuid")
                    .table(Orders::Table)
                    .col(Orders::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // One shadow order per event.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_calendar_event_id")
                    .table(Orders::Table)
                    .col(Orders::CalendarEventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(EventLinks::Table)
                    .col(pk_id_col(manager, EventLinks::Id))
                    .col(ColumnDef::new(EventLinks::Uuid).uuid().not_null())
                    .col(fk_id_col(manager, EventLinks::OrderId))
                    .col(fk_id_col(manager, EventLinks::EventId))
                    .col(timestamp_col(EventLinks::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_links_order_id")
                            .from(EventLinks::Table, EventLinks::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_links_event_id")
                            .from(EventLinks::Table, EventLinks::EventId)
                            .to(CalendarEvents::Table, CalendarEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_event_links_uuid")
                    .table(EventLinks::Table)
                    .col(EventLinks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_event_links_order_id")
                    .table(EventLinks::Table)
                    .col(EventLinks::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_event_links_event_id")
                    .table(EventLinks::Table)
                    .col(EventLinks::EventId)
                    .to_owned(),
            )
            .await?;

        // linked_order_id stays without a store-level foreign key: orders already
        // reference calendar_events, and the calendar workflow maintains it.
        if matches!(manager.get_database_backend(), DatabaseBackend::Sqlite) {
            for column in [
                ColumnDef::new(CalendarEvents::OrderNumber).string().to_owned(),
                ColumnDef::new(CalendarEvents::Client).string().to_owned(),
                ColumnDef::new(CalendarEvents::Supplier).string().to_owned(),
                ColumnDef::new(CalendarEvents::Amount).double().to_owned(),
                fk_id_nullable_col(manager, CalendarEvents::LinkedOrderId),
            ] {
                manager
                    .alter_table(
                        Table::alter()
                            .table(CalendarEvents::Table)
                            .add_column(column)
                            .to_owned(),
                    )
                    .await?;
            }
        } else {
            manager
                .alter_table(
                    Table::alter()
                        .table(CalendarEvents::Table)
                        .add_column(ColumnDef::new(CalendarEvents::OrderNumber).string())
                        .add_column(ColumnDef::new(CalendarEvents::Client).string())
                        .add_column(ColumnDef::new(CalendarEvents::Supplier).string())
                        .add_column(ColumnDef::new(CalendarEvents::Amount).double())
                        .add_column(fk_id_nullable_col(manager, CalendarEvents::LinkedOrderId))
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_calendar_events_linked_order_id")
                    .table(CalendarEvents::Table)
                    .col(CalendarEvents::LinkedOrderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_calendar_events_linked_order_id")
                    .table(CalendarEvents::Table)
                    .to_owned(),
            )
            .await?;

        for column in [
            CalendarEvents::LinkedOrderId,
            CalendarEvents::Amount,
            CalendarEvents::Supplier,
            CalendarEvents::Client,
            CalendarEvents::OrderNumber,
        ] {
            manager
                .alter_table(
                    Table::alter()
                        .table(CalendarEvents::Table)
                        .drop_column(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .drop_table(Table::drop().table(EventLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        Ok(())
    }
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
    fk_id_nullable_col(manager, col).not_null().to_owned()
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
}

#[derive(Iden, Clone, Copy)]
enum CalendarEvents {
    Table,
    Id,
    OrderNumber,
    Client,
    Supplier,
    Amount,
    LinkedOrderId,
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    Uuid,
    CalendarEventId,
    OrderNumber,
    Supplier,
    Client,
    Amount,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum EventLinks {
    Table,
    Id,
    Uuid,
    OrderId,
    EventId,
    CreatedAt,
}
