//! Shared fixtures for service and server tests: an in-memory sqlite
//! database with migrations applied, plus seeding helpers. Panics on failure
//! by design; only ever linked into tests.

use chrono::{DateTime, Utc};
use db::{
    DBService, DbPool,
    entities::action,
    models::{
        ids,
        task::{CreateTask, Task},
        user::{CreateUser, User},
    },
    types::{ActionStatus, TaskCategory, UserRole},
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

pub async fn test_db() -> DBService {
    DBService::new("sqlite::memory:")
        .await
        .expect("in-memory database")
}

pub async fn seed_user(db: &DbPool, username: &str, email: &str, role: UserRole) -> User {
    let data = CreateUser {
        username: username.to_string(),
        email: email.to_string(),
        password: String::new(),
        full_name: None,
        department: None,
        role: Some(role),
    };
    User::create(db, &data, "unused-test-hash".to_string())
        .await
        .expect("seed user")
}

pub async fn seed_task(db: &DbPool, category: TaskCategory, date: &str) -> Task {
    let data = CreateTask {
        title: format!("{category} task for {date}"),
        description: "seeded".to_string(),
        category,
        date: date.to_string(),
        points: None,
    };
    Task::create(db, &data).await.expect("seed task")
}

/// Inserts a check-in row directly, so tests can control timestamp, status
/// and earned points (the model API always stamps "now").
pub async fn seed_action(
    db: &DbPool,
    user_id: Uuid,
    task_id: Uuid,
    status: ActionStatus,
    points_earned: i64,
    timestamp: DateTime<Utc>,
) -> Uuid {
    let user_ref = ids::user_id_by_uuid(db, user_id)
        .await
        .expect("user lookup")
        .expect("seeded user");
    let task_ref = ids::task_id_by_uuid(db, task_id)
        .await
        .expect("task lookup")
        .expect("seeded task");

    let uuid = Uuid::new_v4();
    let active = action::ActiveModel {
        uuid: Set(uuid),
        user_id: Set(user_ref),
        task_id: Set(task_ref),
        timestamp: Set(timestamp.into()),
        ip_address: Set(None),
        device_info: Set(None),
        status: Set(status),
        points_earned: Set(points_earned),
        comment: Set(None),
        ..Default::default()
    };
    active.insert(db).await.expect("seed action");
    uuid
}
