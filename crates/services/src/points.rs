//! Points engine: computes the award for a check-in (category base points,
//! streak bonus, optional manual bonus), credits the user's cumulative total
//! and backfills the earned amount onto the latest matching check-in.

use chrono::{Duration, NaiveTime, Utc};
use config::RewardRules;
use db::{
    DbErr,
    models::{action::Action, task::Task, user::{User, UserError}},
};
use sea_orm::ConnectionTrait;
use thiserror::Error;
use uuid::Uuid;

/// How many days back the streak walk looks from today. With today always
/// counted, the longest observable streak is this plus one.
pub const STREAK_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum PointsError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Clone)]
pub struct PointsService {
    rules: RewardRules,
}

impl PointsService {
    pub fn new(rules: RewardRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RewardRules {
        &self.rules
    }

    /// Length of the user's current check-in streak in days. Today counts as
    /// day one whether or not a check-in exists yet, since this runs while
    /// today's check-in is being awarded. Rejected check-ins do not keep a
    /// day alive.
    pub async fn streak_length<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> Result<u32, DbErr> {
        let today = Utc::now().date_naive();
        let window_start = (today - Duration::days(STREAK_LOOKBACK_DAYS))
            .and_time(NaiveTime::MIN)
            .and_utc();
        let active_days = Action::active_days_since(db, user_id, window_start).await?;

        let mut streak = 1u32;
        for days_ago in 1..=STREAK_LOOKBACK_DAYS {
            if active_days.contains(&(today - Duration::days(days_ago))) {
                streak += 1;
            } else {
                break;
            }
        }
        Ok(streak)
    }

    /// Awards points for a check-in on `task`: category base points plus the
    /// streak bonus plus any manual bonus. Credits the user's total and
    /// stamps the amount onto their latest check-in for the task. Returns
    /// the user's new cumulative total.
    pub async fn award<C: ConnectionTrait>(
        &self,
        db: &C,
        user: &User,
        task: &Task,
        bonus_points: Option<i64>,
    ) -> Result<i64, PointsError> {
        let base = self.rules.base_points(&task.category);
        let streak = self.streak_length(db, user.id).await?;
        let streak_bonus = self.rules.streak_bonus(streak);
        let earned = base + streak_bonus + bonus_points.unwrap_or(0);

        let new_total = User::add_points(db, user.id, earned).await?;

        if Action::set_points_on_latest(db, user.id, task.id, earned)
            .await?
            .is_none()
        {
            tracing::debug!(
                user_id = %user.id,
                task_id = %task.id,
                "no check-in to stamp earned points onto"
            );
        }

        tracing::debug!(
            user_id = %user.id,
            task_id = %task.id,
            base,
            streak,
            streak_bonus,
            earned,
            "awarded check-in points"
        );
        Ok(new_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::types::{ActionStatus, TaskCategory, UserRole};
    use test_support::{seed_action, seed_task, seed_user, test_db};

    fn service() -> PointsService {
        PointsService::new(RewardRules::default())
    }

    fn today_str() -> String {
        Utc::now().date_naive().to_string()
    }

    fn days_ago(n: i64) -> chrono::DateTime<Utc> {
        Utc::now() - Duration::days(n)
    }

    #[tokio::test]
    async fn base_points_follow_task_category() {
        let db = test_db().await;
        let svc = service();
        let date = today_str();

        for (category, expected) in [
            (TaskCategory::Environment, 10),
            (TaskCategory::Society, 8),
            (TaskCategory::Governance, 12),
        ] {
            let email = format!("{category}@example.com");
            let user = seed_user(&db.pool, "worker", &email, UserRole::User).await;
            let task = seed_task(&db.pool, category, &date).await;
            let total = svc.award(&db.pool, &user, &task, None).await.unwrap();
            assert_eq!(total, expected);
        }
    }

    #[tokio::test]
    async fn manual_bonus_is_added_on_top() {
        let db = test_db().await;
        let svc = service();
        let user = seed_user(&db.pool, "bonus", "bonus@example.com", UserRole::User).await;
        let task = seed_task(&db.pool, TaskCategory::Society, &today_str()).await;

        let total = svc.award(&db.pool, &user, &task, Some(3)).await.unwrap();
        assert_eq!(total, 11);
    }

    #[tokio::test]
    async fn streak_counts_today_unconditionally() {
        let db = test_db().await;
        let svc = service();
        let user = seed_user(&db.pool, "fresh", "fresh@example.com", UserRole::User).await;
        assert_eq!(svc.streak_length(&db.pool, user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn streak_walks_back_over_consecutive_days() {
        let db = test_db().await;
        let svc = service();
        let user = seed_user(&db.pool, "streaker", "streak@example.com", UserRole::User).await;

        // one task per day, since a user checks in on each task at most once
        for n in [1, 2, 4] {
            let date = (Utc::now().date_naive() - Duration::days(n)).to_string();
            let task = seed_task(&db.pool, TaskCategory::Environment, &date).await;
            seed_action(
                &db.pool,
                user.id,
                task.id,
                ActionStatus::Completed,
                10,
                days_ago(n),
            )
            .await;
        }

        // day 4 is active but the gap at day 3 ends the walk

        assert_eq!(svc.streak_length(&db.pool, user.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn rejected_checkins_do_not_extend_the_streak() {
        let db = test_db().await;
        let svc = service();
        let user = seed_user(&db.pool, "rej", "rej@example.com", UserRole::User).await;
        let task = seed_task(&db.pool, TaskCategory::Environment, &today_str()).await;

        seed_action(
            &db.pool,
            user.id,
            task.id,
            ActionStatus::Rejected,
            0,
            days_ago(1),
        )
        .await;

        assert_eq!(svc.streak_length(&db.pool, user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn only_the_highest_crossed_threshold_pays_out() {
        let db = test_db().await;
        let svc = service();
        let user = seed_user(&db.pool, "veteran", "vet@example.com", UserRole::User).await;

        // 7 prior days plus today puts the streak at 8: the 7-day bonus
        // applies alone, not stacked with the 3-day one.
        for n in 1..=7 {
            let date = (Utc::now().date_naive() - Duration::days(n)).to_string();
            let task = seed_task(&db.pool, TaskCategory::Environment, &date).await;
            seed_action(
                &db.pool,
                user.id,
                task.id,
                ActionStatus::Completed,
                10,
                days_ago(n),
            )
            .await;
        }

        assert_eq!(svc.streak_length(&db.pool, user.id).await.unwrap(), 8);
        let task = seed_task(&db.pool, TaskCategory::Environment, &today_str()).await;
        let total = svc.award(&db.pool, &user, &task, None).await.unwrap();
        assert_eq!(total, 20);
    }

    #[tokio::test]
    async fn awarding_twice_credits_twice() {
        let db = test_db().await;
        let svc = service();
        let user = seed_user(&db.pool, "double", "double@example.com", UserRole::User).await;
        let task = seed_task(&db.pool, TaskCategory::Governance, &today_str()).await;

        assert_eq!(svc.award(&db.pool, &user, &task, None).await.unwrap(), 12);
        // the first award's check-in (if any) now counts toward today, but
        // today was already counted, so the second award is identical
        assert_eq!(svc.award(&db.pool, &user, &task, None).await.unwrap(), 24);
    }

    #[tokio::test]
    async fn award_stamps_points_onto_the_latest_checkin() {
        let db = test_db().await;
        let svc = service();
        let user = seed_user(&db.pool, "stamp", "stamp@example.com", UserRole::User).await;
        let task = seed_task(&db.pool, TaskCategory::Environment, &today_str()).await;

        let action_id = seed_action(
            &db.pool,
            user.id,
            task.id,
            ActionStatus::Completed,
            0,
            Utc::now(),
        )
        .await;
        svc.award(&db.pool, &user, &task, None).await.unwrap();

        let action = Action::find_by_id(&db.pool, action_id)
            .await
            .unwrap()
            .unwrap();
        // one prior day was not seeded, so this is base only
        assert_eq!(action.points_earned, 10);
    }

    #[tokio::test]
    async fn award_without_a_checkin_still_credits_the_user() {
        let db = test_db().await;
        let svc = service();
        let user = seed_user(&db.pool, "nocheck", "nocheck@example.com", UserRole::User).await;
        let task = seed_task(&db.pool, TaskCategory::Society, &today_str()).await;

        let total = svc.award(&db.pool, &user, &task, None).await.unwrap();
        assert_eq!(total, 8);
        let reloaded = User::find_by_id(&db.pool, user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.points, 8);
    }
}
