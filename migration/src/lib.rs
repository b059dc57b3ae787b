pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_recipients_table;
mod m20250301_000002_create_auth_sessions_table;
mod m20250302_000001_create_schedules_table;
mod m20250302_000002_create_schedule_index_table;
mod m20250303_000001_create_transactions_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_recipients_table::Migration),
            Box::new(m20250301_000002_create_auth_sessions_table::Migration),
            Box::new(m20250302_000001_create_schedules_table::Migration),
            Box::new(m20250302_000002_create_schedule_index_table::Migration),
            Box::new(m20250303_000001_create_transactions_table::Migration)
        ]
    }
}
