use sea_orm_migration::prelude::*;

/// Rows created before this migration keep a NULL category; readers infer it
/// from the event type name.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(EventTypes::Table)
                    .add_column(ColumnDef::new(EventTypes::Category).string_len(32))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(EventTypes::Table)
                    .drop_column(EventTypes::Category)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum EventTypes {
    Table,
    Category,
}
