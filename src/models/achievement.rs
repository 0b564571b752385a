use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Investment,
    Streak,
    Referral,
    Level,
    Special,
}

/// What unlocks an achievement. Thresholds are interpreted per kind:
/// a count for `InvestmentCount`, a currency amount for `TotalInvested`,
/// a streak length for `LoginStreak`; `Level` compares the user's tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AchievementCriteria {
    InvestmentCount { threshold: i64 },
    TotalInvested { threshold: f64 },
    LoginStreak { threshold: i32 },
    Level { level: Tier },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub points_reward: i32,
    pub criteria: AchievementCriteria,
    pub category: AchievementCategory,
    pub is_active: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub achievement_id: ObjectId,
    pub unlocked_at: bson::DateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAchievement {
    #[validate(length(min = 3, message = "Achievement name must be at least 3 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Points reward cannot be negative"))]
    pub points_reward: i32,
    pub criteria: AchievementCriteria,
    pub category: AchievementCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_tags_by_kind() {
        let criteria = AchievementCriteria::InvestmentCount { threshold: 5 };
        let json = serde_json::to_value(&criteria).unwrap();
        assert_eq!(json["kind"], "investment_count");
        assert_eq!(json["threshold"], 5);

        let level = AchievementCriteria::Level { level: Tier::Gold };
        let json = serde_json::to_value(&level).unwrap();
        assert_eq!(json["kind"], "level");
        assert_eq!(json["level"], "gold");
    }
}
