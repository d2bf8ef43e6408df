use sea_orm_migration::prelude::*;

mod m20250101000000_baseline;
mod m20250301000000_orders_system;
mod m20250315000000_event_type_category;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101000000_baseline::Migration),
            Box::new(m20250301000000_orders_system::Migration),
            Box::new(m20250315000000_event_type_category::Migration),
        ]
    }
}
