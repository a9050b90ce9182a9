use sea_orm_migration::prelude::*;

mod m20250901000000_baseline;
mod m20250915000000_action_user_task_unique;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901000000_baseline::Migration),
            Box::new(m20250915000000_action_user_task_unique::Migration),
        ]
    }
}
