use axum::{
    extract::State,
    response::Json,
    Extension,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Collection;
use serde::Serialize;
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::achievement::{Achievement, CreateAchievement, UserAchievement};
use crate::models::points::PointsTransaction;
use crate::models::user::{Claims, Tier, User};
use crate::services::growth::next_tier_target;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NextTier {
    pub level: Tier,
    pub minimum: f64,
    pub remaining: f64,
}

#[derive(Debug, Serialize)]
pub struct GamificationProfile {
    pub level: Tier,
    pub total_points: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_invested: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tier: Option<NextTier>,
}

#[derive(Debug, Serialize)]
pub struct UnlockedAchievement {
    pub achievement: Achievement,
    pub unlocked_at: mongodb::bson::DateTime,
}

// Level, points and streaks in one shot, with progress to the next tier
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<GamificationProfile>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;

    let users: Collection<User> = state.db.collection("users");
    let user = users
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or(AppError::UserNotFound)?;

    let total_invested = state.gamification.total_invested(user_id).await?;

    let thresholds = state.config.tier_thresholds();
    let next_tier = next_tier_target(user.level, &thresholds).map(|(level, minimum)| NextTier {
        level,
        minimum,
        remaining: (minimum - total_invested).max(0.0),
    });

    Ok(Json(GamificationProfile {
        level: user.level,
        total_points: user.total_points,
        current_streak: user.current_streak,
        longest_streak: user.longest_streak,
        total_invested,
        next_tier,
    }))
}

// My points ledger, newest first
pub async fn get_points_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PointsTransaction>>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;
    let collection: Collection<PointsTransaction> = state.db.collection("points_transactions");

    let cursor = collection.find(doc! { "user_id": user_id }).await?;
    let mut entries: Vec<PointsTransaction> = cursor.try_collect().await?;
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(entries))
}

pub async fn get_achievements(
    State(state): State<AppState>,
) -> Result<Json<Vec<Achievement>>> {
    let collection: Collection<Achievement> = state.db.collection("achievements");
    let achievements: Vec<Achievement> = collection
        .find(doc! { "is_active": true })
        .await?
        .try_collect()
        .await?;

    Ok(Json(achievements))
}

pub async fn get_my_achievements(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UnlockedAchievement>>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;

    let unlocked: Collection<UserAchievement> = state.db.collection("user_achievements");
    let entries: Vec<UserAchievement> = unlocked
        .find(doc! { "user_id": user_id })
        .await?
        .try_collect()
        .await?;

    if entries.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let ids: Vec<ObjectId> = entries.iter().map(|e| e.achievement_id).collect();
    let achievements: Collection<Achievement> = state.db.collection("achievements");
    let found: Vec<Achievement> = achievements
        .find(doc! { "_id": { "$in": ids } })
        .await?
        .try_collect()
        .await?;

    let mut result = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(achievement) = found
            .iter()
            .find(|a| a._id == Some(entry.achievement_id))
        {
            result.push(UnlockedAchievement {
                achievement: achievement.clone(),
                unlocked_at: entry.unlocked_at,
            });
        }
    }

    Ok(Json(result))
}

// Provision an achievement (admin only)
pub async fn create_achievement(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAchievement>,
) -> Result<Json<Achievement>> {
    if !claims.is_admin() {
        return Err(AppError::Unauthorized);
    }
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let now = Utc::now();
    let achievement = Achievement {
        _id: Some(ObjectId::new()),
        name: payload.name.clone(),
        description: payload.description.clone(),
        points_reward: payload.points_reward,
        criteria: payload.criteria.clone(),
        category: payload.category,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let collection: Collection<Achievement> = state.db.collection("achievements");
    collection.insert_one(&achievement).await?;

    Ok(Json(achievement))
}
