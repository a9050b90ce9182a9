use sea_orm::entity::prelude::*;

use crate::types::ActionStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_actions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub task_id: i64,
    pub timestamp: DateTimeUtc,
    pub ip_address: Option<String>,
    pub device_info: Option<String>,
    pub status: ActionStatus,
    pub points_earned: i64,
    pub comment: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
