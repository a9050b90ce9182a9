//! Read-side aggregations: leaderboard, per-user statistics and the user,
//! admin and public dashboards.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveTime, Utc};
use db::{
    DbErr,
    models::{action::Action, task::Task, user::User},
    types::TaskCategory,
};
use sea_orm::{ConnectionTrait, Iterable};
use serde::Serialize;
use uuid::Uuid;

/// How far back the points history aggregates, in days.
pub const HISTORY_DAYS: i64 = 30;
/// The stats streak walk covers today plus this many prior days minus one.
pub const STATS_STREAK_WINDOW_DAYS: i64 = 30;
/// Rank lookups scan this many leaderboard rows; users below are unranked.
pub const RANK_SCAN_LIMIT: u64 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: Uuid,
    pub username: String,
    pub points: i64,
}

/// Top users by points with dense sequential ranks starting at 1. Ties get
/// adjacent ranks in a stable order.
pub async fn leaderboard<C: ConnectionTrait>(
    db: &C,
    limit: u64,
) -> Result<Vec<LeaderboardEntry>, DbErr> {
    let users = User::top_by_points(db, limit).await?;
    Ok(users
        .into_iter()
        .enumerate()
        .map(|(index, user)| LeaderboardEntry {
            rank: index as u32 + 1,
            user_id: user.id,
            username: user.username,
            points: user.points,
        })
        .collect())
}

/// The user's leaderboard rank, or `None` when outside the scanned window.
pub async fn rank_of<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Option<u32>, DbErr> {
    let entries = leaderboard(db, RANK_SCAN_LIMIT).await?;
    Ok(entries
        .iter()
        .find(|entry| entry.user_id == user_id)
        .map(|entry| entry.rank))
}

/// Points earned per UTC calendar day over the trailing window, keyed by
/// ISO date. Days without check-ins are absent; rejected check-ins are
/// excluded.
pub async fn points_history<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    days: i64,
) -> Result<BTreeMap<String, i64>, DbErr> {
    let since = Utc::now() - Duration::days(days);
    let mut history = BTreeMap::new();
    for (timestamp, points) in Action::earned_since(db, user_id, since).await? {
        *history
            .entry(timestamp.date_naive().to_string())
            .or_insert(0) += points;
    }
    Ok(history)
}

/// Streak length as reported on the stats endpoints. Unlike the award-time
/// walk, a missing check-in today does not break the chain, so the streak
/// earned yesterday still shows until the day rolls past.
pub async fn streak_days<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u32, DbErr> {
    let today = Utc::now().date_naive();
    let window_start = (today - Duration::days(STATS_STREAK_WINDOW_DAYS - 1))
        .and_time(NaiveTime::MIN)
        .and_utc();
    let active_days = Action::active_days_since(db, user_id, window_start).await?;

    let mut streak = 0u32;
    for days_ago in 0..STATS_STREAK_WINDOW_DAYS {
        if active_days.contains(&(today - Duration::days(days_ago))) {
            streak += 1;
        } else if days_ago > 0 {
            break;
        }
    }
    Ok(streak)
}

/// Check-in counts per task category, optionally scoped to one user.
pub async fn category_counts<C: ConnectionTrait>(
    db: &C,
    user_id: Option<Uuid>,
) -> Result<BTreeMap<String, u64>, DbErr> {
    let mut counts = BTreeMap::new();
    for category in TaskCategory::iter() {
        let count = Action::count_in_category(db, category.clone(), user_id).await?;
        counts.insert(category.to_string(), count);
    }
    Ok(counts)
}

#[derive(Debug, Serialize)]
pub struct UserActionStats {
    pub total_actions: u64,
    pub total_points: i64,
    pub current_rank: Option<u32>,
    pub streak_days: u32,
    pub actions_by_category: BTreeMap<String, u64>,
    pub points_history: BTreeMap<String, i64>,
}

pub async fn user_action_stats<C: ConnectionTrait>(
    db: &C,
    user: &User,
) -> Result<UserActionStats, DbErr> {
    Ok(UserActionStats {
        total_actions: Action::count_for_user(db, user.id).await?,
        total_points: user.points,
        current_rank: rank_of(db, user.id).await?,
        streak_days: streak_days(db, user.id).await?,
        actions_by_category: category_counts(db, Some(user.id)).await?,
        points_history: points_history(db, user.id, HISTORY_DAYS).await?,
    })
}

#[derive(Debug, Serialize)]
pub struct UserDashboard {
    pub user_id: Uuid,
    pub username: String,
    pub points: i64,
    pub current_rank: Option<u32>,
    pub streak_days: u32,
    pub total_checkins: u64,
    pub checkins_last_7_days: u64,
    pub checkins_by_category: BTreeMap<String, u64>,
    pub recent_checkins: Vec<Action>,
}

pub async fn user_dashboard<C: ConnectionTrait>(
    db: &C,
    user: &User,
) -> Result<UserDashboard, DbErr> {
    let week_ago = Utc::now() - Duration::days(7);
    Ok(UserDashboard {
        user_id: user.id,
        username: user.username.clone(),
        points: user.points,
        current_rank: rank_of(db, user.id).await?,
        streak_days: streak_days(db, user.id).await?,
        total_checkins: Action::count_for_user(db, user.id).await?,
        checkins_last_7_days: Action::count_for_user_since(db, user.id, week_ago).await?,
        checkins_by_category: category_counts(db, Some(user.id)).await?,
        recent_checkins: Action::recent_for_user(db, user.id, 5).await?,
    })
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub total_users: u64,
    pub total_tasks: u64,
    pub total_checkins: u64,
    pub new_users_last_7_days: u64,
    pub checkins_last_7_days: u64,
    pub active_users_today: u64,
    pub checkins_by_category: BTreeMap<String, u64>,
    pub top_users: Vec<LeaderboardEntry>,
}

pub async fn admin_dashboard<C: ConnectionTrait>(db: &C) -> Result<AdminDashboard, DbErr> {
    let now = Utc::now();
    let week_ago = now - Duration::days(7);
    let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let day_end = day_start + Duration::days(1);

    Ok(AdminDashboard {
        total_users: User::count(db).await?,
        total_tasks: Task::count(db).await?,
        total_checkins: Action::count(db).await?,
        new_users_last_7_days: User::count_created_since(db, week_ago).await?,
        checkins_last_7_days: Action::count_since(db, week_ago).await?,
        active_users_today: Action::distinct_user_count_between(db, day_start, day_end).await?,
        checkins_by_category: category_counts(db, None).await?,
        top_users: leaderboard(db, 10).await?,
    })
}

/// Public, unauthenticated system overview.
#[derive(Debug, Serialize)]
pub struct SystemOverview {
    pub total_users: u64,
    pub total_tasks: u64,
    pub total_checkins: u64,
    pub checkins_by_category: BTreeMap<String, u64>,
    pub top_users: Vec<LeaderboardEntry>,
}

pub async fn system_overview<C: ConnectionTrait>(db: &C) -> Result<SystemOverview, DbErr> {
    Ok(SystemOverview {
        total_users: User::count(db).await?,
        total_tasks: Task::count(db).await?,
        total_checkins: Action::count(db).await?,
        checkins_by_category: category_counts(db, None).await?,
        top_users: leaderboard(db, 5).await?,
    })
}
