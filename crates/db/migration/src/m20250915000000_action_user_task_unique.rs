use sea_orm_migration::prelude::*;

// One check-in per (user, task). Closes the check-then-insert race at the
// store level; concurrent duplicates surface as a unique violation.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_actions_user_task_unique")
                    .table(UserActions::Table)
                    .col(UserActions::UserId)
                    .col(UserActions::TaskId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_user_actions_user_task_unique")
                    .table(UserActions::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum UserActions {
    Table,
    UserId,
    TaskId,
}
