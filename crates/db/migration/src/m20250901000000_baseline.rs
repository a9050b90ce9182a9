use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Users::Table)
                    .col(pk_id_col(manager, Users::Id))
                    .col(uuid_col(Users::Uuid))
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("user")),
                    )
                    .col(
                        ColumnDef::new(Users::Points)
                            .big_integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(ColumnDef::new(Users::FullName).string())
                    .col(ColumnDef::new(Users::Department).string())
                    .col(timestamp_col(Users::CreatedAt))
                    .col(timestamp_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_users_uuid")
                    .table(Users::Table)
                    .col(Users::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_users_username")
                    .table(Users::Table)
                    .col(Users::Username)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(EsgTasks::Table)
                    .col(pk_id_col(manager, EsgTasks::Id))
                    .col(uuid_col(EsgTasks::Uuid))
                    .col(ColumnDef::new(EsgTasks::Title).string().not_null())
                    .col(ColumnDef::new(EsgTasks::Description).text().not_null())
                    .col(ColumnDef::new(EsgTasks::Category).string_len(32).not_null())
                    .col(ColumnDef::new(EsgTasks::Date).string_len(10).not_null())
                    .col(
                        ColumnDef::new(EsgTasks::Points)
                            .big_integer()
                            .not_null()
                            .default(Expr::val(10)),
                    )
                    .col(timestamp_col(EsgTasks::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_esg_tasks_uuid")
                    .table(EsgTasks::Table)
                    .col(EsgTasks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_esg_tasks_category")
                    .table(EsgTasks::Table)
                    .col(EsgTasks::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_esg_tasks_date")
                    .table(EsgTasks::Table)
                    .col(EsgTasks::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(UserActions::Table)
                    .col(pk_id_col(manager, UserActions::Id))
                    .col(uuid_col(UserActions::Uuid))
                    .col(fk_id_col(manager, UserActions::UserId))
                    .col(fk_id_col(manager, UserActions::TaskId))
                    .col(timestamp_col(UserActions::Timestamp))
                    .col(ColumnDef::new(UserActions::IpAddress).string())
                    .col(ColumnDef::new(UserActions::DeviceInfo).string())
                    .col(
                        ColumnDef::new(UserActions::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("completed")),
                    )
                    .col(
                        ColumnDef::new(UserActions::PointsEarned)
                            .big_integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(ColumnDef::new(UserActions::Comment).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_actions_user_id")
                            .from(UserActions::Table, UserActions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_actions_task_id")
                            .from(UserActions::Table, UserActions::TaskId)
                            .to(EsgTasks::Table, EsgTasks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_actions_uuid")
                    .table(UserActions::Table)
                    .col(UserActions::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_actions_user_id")
                    .table(UserActions::Table)
                    .col(UserActions::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_actions_task_id")
                    .table(UserActions::Table)
                    .col(UserActions::TaskId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_actions_timestamp")
                    .table(UserActions::Table)
                    .col(UserActions::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_actions_status")
                    .table(UserActions::Table)
                    .col(UserActions::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserActions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EsgTasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
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
    Username,
    Email,
    PasswordHash,
    Role,
    Points,
    FullName,
    Department,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum EsgTasks {
    Table,
    Id,
    Uuid,
    Title,
    Description,
    Category,
    Date,
    Points,
    CreatedAt,
}

#[derive(Iden)]
enum UserActions {
    Table,
    Id,
    Uuid,
    UserId,
    TaskId,
    Timestamp,
    IpAddress,
    DeviceInfo,
    Status,
    PointsEarned,
    Comment,
}
