pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_exchange_schema;
mod m20251001_000002_seed_reference_data;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_exchange_schema::Migration),
            Box::new(m20251001_000002_seed_reference_data::Migration),
        ]
    }
}
