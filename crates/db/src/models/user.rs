use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{entities::user, types::UserRole};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub points: i64,
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub role: Option<UserRole>,
}

impl User {
    fn from_model(model: user::Model) -> Self {
        Self {
            id: model.uuid,
            username: model.username,
            email: model.email,
            role: model.role,
            points: model.points,
            full_name: model.full_name,
            department: model.department,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateUser,
        password_hash: String,
    ) -> Result<Self, UserError> {
        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(&data.email))
            .one(db)
            .await?
            .is_some();
        if taken {
            return Err(UserError::EmailTaken);
        }

        let now = Utc::now();
        let active = user::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            username: Set(data.username.clone()),
            email: Set(data.email.clone()),
            password_hash: Set(password_hash),
            role: Set(data.role.clone().unwrap_or_default()),
            points: Set(0),
            full_name: Set(data.full_name.clone()),
            department: Set(data.department.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Returns the user together with their stored password hash, for login.
    pub async fn credentials_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<(Self, String)>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db)
            .await?;
        Ok(record.map(|model| {
            let hash = model.password_hash.clone();
            (Self::from_model(model), hash)
        }))
    }

    /// Top users by cumulative points. Ties break by insertion order so
    /// repeated queries return the same sequence.
    pub async fn top_by_points<C: ConnectionTrait>(
        db: &C,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        let records = user::Entity::find()
            .order_by_desc(user::Column::Points)
            .order_by_asc(user::Column::Id)
            .limit(limit)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    /// Applies a signed delta to the user's cumulative points and returns the
    /// new total.
    pub async fn add_points<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        delta: i64,
    ) -> Result<i64, UserError> {
        let record = user::Entity::find()
            .filter(user::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(UserError::NotFound)?;

        let new_total = record.points + delta;
        let mut active: user::ActiveModel = record.into();
        active.points = Set(new_total);
        active.updated_at = Set(Utc::now().into());
        active.update(db).await?;
        Ok(new_total)
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        user::Entity::find().count(db).await
    }

    pub async fn count_created_since<C: ConnectionTrait>(
        db: &C,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        user::Entity::find()
            .filter(user::Column::CreatedAt.gte(cutoff))
            .count(db)
            .await
    }
}
