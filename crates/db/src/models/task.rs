use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{entities::task, types::TaskCategory};

pub const DEFAULT_TASK_POINTS: i64 = 10;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub date: String,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub date: String,
    pub points: Option<i64>,
}

impl Task {
    fn from_model(model: task::Model) -> Self {
        Self {
            id: model.uuid,
            title: model.title,
            description: model.description,
            category: model.category,
            date: model.date,
            points: model.points,
            created_at: model.created_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateTask) -> Result<Self, DbErr> {
        let active = task::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            category: Set(data.category.clone()),
            date: Set(data.date.clone()),
            points: Set(data.points.unwrap_or(DEFAULT_TASK_POINTS)),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_filtered<C: ConnectionTrait>(
        db: &C,
        category: Option<TaskCategory>,
        date: Option<&str>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = task::Entity::find().order_by_asc(task::Column::Date);
        if let Some(category) = category {
            query = query.filter(task::Column::Category.eq(category));
        }
        if let Some(date) = date {
            query = query.filter(task::Column::Date.eq(date));
        }
        let records = query.all(db).await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        task::Entity::find().count(db).await
    }
}
