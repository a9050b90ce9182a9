use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use db::types::TaskCategory;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOKEN_EXPIRY_MINUTES: i64 = 30;

/// Reward rules for the points engine. Constructed once at startup (or per
/// test) and injected, never read from process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRules {
    pub points_by_category: HashMap<TaskCategory, i64>,
    pub default_points: i64,
    /// streak length threshold -> bonus points
    pub streak_bonuses: BTreeMap<u32, i64>,
}

impl Default for RewardRules {
    fn default() -> Self {
        Self {
            points_by_category: HashMap::from([
                (TaskCategory::Environment, 10),
                (TaskCategory::Society, 8),
                (TaskCategory::Governance, 12),
            ]),
            default_points: 5,
            streak_bonuses: BTreeMap::from([(3, 5), (7, 10), (30, 50)]),
        }
    }
}

impl RewardRules {
    pub fn base_points(&self, category: &TaskCategory) -> i64 {
        self.points_by_category
            .get(category)
            .copied()
            .unwrap_or(self.default_points)
    }

    /// Bonus for the single highest satisfied threshold; thresholds are not
    /// cumulative.
    pub fn streak_bonus(&self, streak_days: u32) -> i64 {
        self.streak_bonuses
            .iter()
            .rev()
            .find(|(threshold, _)| streak_days >= **threshold)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_expiry_minutes: i64,
    pub rewards: RewardRules,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("BACKEND_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(8000);
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://esg.sqlite?mode=rwc".to_string());
        let jwt_secret = std::env::var("ESG_JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("ESG_JWT_SECRET not set; using an insecure development secret");
            "dev-secret-change-me".to_string()
        });
        let token_expiry_minutes = std::env::var("ESG_TOKEN_EXPIRY_MINUTES")
            .ok()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_TOKEN_EXPIRY_MINUTES);
        let rewards = match std::env::var("ESG_REWARDS_PATH") {
            Ok(path) => load_rewards(Path::new(&path)),
            Err(_) => RewardRules::default(),
        };

        Self {
            host,
            port,
            database_url,
            jwt_secret,
            token_expiry_minutes,
            rewards,
        }
    }
}

fn load_rewards(path: &Path) -> RewardRules {
    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(rules) => rules,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Invalid reward rules file; using defaults");
                RewardRules::default()
            }
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Failed to read reward rules file; using defaults");
            RewardRules::default()
        }
    }
}
