use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::Query;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entities::{action, task},
    models::ids,
    types::{ActionStatus, TaskCategory},
};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Check-in not found")]
    NotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Task not found")]
    TaskNotFound,
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub device_info: Option<String>,
    pub status: ActionStatus,
    pub points_earned: i64,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAction {
    pub task_id: Uuid,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAction {
    pub status: Option<ActionStatus>,
    pub points_earned: Option<i64>,
    pub comment: Option<String>,
}

/// Filters for check-in listings. `None` fields are not applied.
#[derive(Debug, Clone, Default)]
pub struct ActionFilter {
    pub user_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub status: Option<ActionStatus>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Action {
    async fn from_model<C: ConnectionTrait>(db: &C, model: action::Model) -> Result<Self, DbErr> {
        let user_uuid = ids::user_uuid_by_id(db, model.user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        let task_uuid = ids::task_uuid_by_id(db, model.task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        Ok(Self {
            id: model.uuid,
            user_id: user_uuid,
            task_id: task_uuid,
            timestamp: model.timestamp.into(),
            ip_address: model.ip_address,
            device_info: model.device_info,
            status: model.status,
            points_earned: model.points_earned,
            comment: model.comment,
        })
    }

    async fn from_models<C: ConnectionTrait>(
        db: &C,
        models: Vec<action::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut actions = Vec::with_capacity(models.len());
        for model in models {
            actions.push(Self::from_model(db, model).await?);
        }
        Ok(actions)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &CreateAction,
        ip_address: Option<String>,
        device_info: Option<String>,
    ) -> Result<Self, ActionError> {
        let user_ref = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(ActionError::UserNotFound)?;
        let task_ref = ids::task_id_by_uuid(db, data.task_id)
            .await?
            .ok_or(ActionError::TaskNotFound)?;

        let active = action::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_ref),
            task_id: Set(task_ref),
            timestamp: Set(Utc::now().into()),
            ip_address: Set(ip_address),
            device_info: Set(device_info),
            status: Set(ActionStatus::Completed),
            points_earned: Set(0),
            comment: Set(data.comment.clone()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(db, model).await?)
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = action::Entity::find()
            .filter(action::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Whether the user has already checked in on the given task.
    pub async fn exists_for_user_task<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        task_id: Uuid,
    ) -> Result<bool, DbErr> {
        let (Some(user_ref), Some(task_ref)) = (
            ids::user_id_by_uuid(db, user_id).await?,
            ids::task_id_by_uuid(db, task_id).await?,
        ) else {
            return Ok(false);
        };

        let count = action::Entity::find()
            .filter(action::Column::UserId.eq(user_ref))
            .filter(action::Column::TaskId.eq(task_ref))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// Overwrites `points_earned` on the most recent check-in for the
    /// (user, task) pair. Returns `None` when no such check-in exists.
    pub async fn set_points_on_latest<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        task_id: Uuid,
        points: i64,
    ) -> Result<Option<Self>, DbErr> {
        let (Some(user_ref), Some(task_ref)) = (
            ids::user_id_by_uuid(db, user_id).await?,
            ids::task_id_by_uuid(db, task_id).await?,
        ) else {
            return Ok(None);
        };

        let record = action::Entity::find()
            .filter(action::Column::UserId.eq(user_ref))
            .filter(action::Column::TaskId.eq(task_ref))
            .order_by_desc(action::Column::Timestamp)
            .one(db)
            .await?;
        let Some(record) = record else {
            return Ok(None);
        };

        let mut active: action::ActiveModel = record.into();
        active.points_earned = Set(points);
        let updated = active.update(db).await?;
        Ok(Some(Self::from_model(db, updated).await?))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateAction,
    ) -> Result<Self, ActionError> {
        let record = action::Entity::find()
            .filter(action::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(ActionError::NotFound)?;

        let mut active: action::ActiveModel = record.into();
        if let Some(status) = data.status.clone() {
            active.status = Set(status);
        }
        if let Some(points_earned) = data.points_earned {
            active.points_earned = Set(points_earned);
        }
        if let Some(comment) = data.comment.clone() {
            active.comment = Set(Some(comment));
        }

        let updated = active.update(db).await?;
        Ok(Self::from_model(db, updated).await?)
    }

    pub async fn find_filtered<C: ConnectionTrait>(
        db: &C,
        filter: &ActionFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = action::Entity::find().order_by_desc(action::Column::Timestamp);

        if let Some(user_id) = filter.user_id {
            let Some(user_ref) = ids::user_id_by_uuid(db, user_id).await? else {
                return Ok(Vec::new());
            };
            query = query.filter(action::Column::UserId.eq(user_ref));
        }
        if let Some(task_id) = filter.task_id {
            let Some(task_ref) = ids::task_id_by_uuid(db, task_id).await? else {
                return Ok(Vec::new());
            };
            query = query.filter(action::Column::TaskId.eq(task_ref));
        }
        if let Some(status) = filter.status.clone() {
            query = query.filter(action::Column::Status.eq(status));
        }
        if let Some(start) = filter.start {
            query = query.filter(action::Column::Timestamp.gte(start));
        }
        if let Some(end) = filter.end {
            query = query.filter(action::Column::Timestamp.lte(end));
        }

        let records = query.all(db).await?;
        Self::from_models(db, records).await
    }

    pub async fn recent_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        let Some(user_ref) = ids::user_id_by_uuid(db, user_id).await? else {
            return Ok(Vec::new());
        };
        let records = action::Entity::find()
            .filter(action::Column::UserId.eq(user_ref))
            .order_by_desc(action::Column::Timestamp)
            .limit(limit)
            .all(db)
            .await?;
        Self::from_models(db, records).await
    }

    /// Distinct UTC calendar days on which the user has a non-rejected
    /// check-in at or after `since`. Both streak walks run over this set.
    pub async fn active_days_since<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<HashSet<NaiveDate>, DbErr> {
        let Some(user_ref) = ids::user_id_by_uuid(db, user_id).await? else {
            return Ok(HashSet::new());
        };
        let timestamps: Vec<DateTime<Utc>> = action::Entity::find()
            .select_only()
            .column(action::Column::Timestamp)
            .filter(action::Column::UserId.eq(user_ref))
            .filter(action::Column::Status.ne(ActionStatus::Rejected))
            .filter(action::Column::Timestamp.gte(since))
            .into_tuple()
            .all(db)
            .await?;
        Ok(timestamps.into_iter().map(|ts| ts.date_naive()).collect())
    }

    /// (timestamp, points_earned) pairs of non-rejected check-ins at or after
    /// `since`, for points-history aggregation.
    pub async fn earned_since<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, i64)>, DbErr> {
        let Some(user_ref) = ids::user_id_by_uuid(db, user_id).await? else {
            return Ok(Vec::new());
        };
        action::Entity::find()
            .select_only()
            .column(action::Column::Timestamp)
            .column(action::Column::PointsEarned)
            .filter(action::Column::UserId.eq(user_ref))
            .filter(action::Column::Status.ne(ActionStatus::Rejected))
            .filter(action::Column::Timestamp.gte(since))
            .into_tuple()
            .all(db)
            .await
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        action::Entity::find().count(db).await
    }

    pub async fn count_since<C: ConnectionTrait>(
        db: &C,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        action::Entity::find()
            .filter(action::Column::Timestamp.gte(cutoff))
            .count(db)
            .await
    }

    pub async fn count_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
        let Some(user_ref) = ids::user_id_by_uuid(db, user_id).await? else {
            return Ok(0);
        };
        action::Entity::find()
            .filter(action::Column::UserId.eq(user_ref))
            .count(db)
            .await
    }

    pub async fn count_for_user_since<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let Some(user_ref) = ids::user_id_by_uuid(db, user_id).await? else {
            return Ok(0);
        };
        action::Entity::find()
            .filter(action::Column::UserId.eq(user_ref))
            .filter(action::Column::Timestamp.gte(cutoff))
            .count(db)
            .await
    }

    /// Distinct users with any check-in inside the half-open window
    /// `[start, end)`.
    pub async fn distinct_user_count_between<C: ConnectionTrait>(
        db: &C,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let user_refs: Vec<i64> = action::Entity::find()
            .select_only()
            .column(action::Column::UserId)
            .distinct()
            .filter(action::Column::Timestamp.gte(start))
            .filter(action::Column::Timestamp.lt(end))
            .into_tuple()
            .all(db)
            .await?;
        Ok(user_refs.len() as u64)
    }

    /// Check-in count for tasks of one category, optionally scoped to a user.
    pub async fn count_in_category<C: ConnectionTrait>(
        db: &C,
        category: TaskCategory,
        user_id: Option<Uuid>,
    ) -> Result<u64, DbErr> {
        let task_ids = Query::select()
            .column(task::Column::Id)
            .from(task::Entity)
            .and_where(task::Column::Category.eq(category))
            .to_owned();

        let mut query = action::Entity::find().filter(action::Column::TaskId.in_subquery(task_ids));
        if let Some(user_id) = user_id {
            let Some(user_ref) = ids::user_id_by_uuid(db, user_id).await? else {
                return Ok(0);
            };
            query = query.filter(action::Column::UserId.eq(user_ref));
        }
        query.count(db).await
    }
}
