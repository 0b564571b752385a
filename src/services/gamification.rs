use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::{Collection, Database};

use crate::config::TierThresholds;
use crate::errors::{AppError, Result};
use crate::models::achievement::{Achievement, AchievementCriteria, UserAchievement};
use crate::models::points::{PointsReference, PointsTransaction, PointsType};
use crate::models::referral::Referral;
use crate::models::user::{Tier, User};
use crate::services::growth::classify_tier;

/// Daily login reward.
const DAILY_LOGIN_POINTS: i32 = 10;

/// Points ledger, loyalty level upkeep, streaks, referrals and
/// achievements. Everything here is derived bookkeeping around the pure
/// classifier in `services::growth`.
#[derive(Clone)]
pub struct GamificationService {
    db: Database,
    thresholds: TierThresholds,
    referral_reward_points: i32,
}

impl GamificationService {
    pub fn new(db: Database, thresholds: TierThresholds, referral_reward_points: i32) -> Self {
        Self {
            db,
            thresholds,
            referral_reward_points,
        }
    }

    /// One point per 10 currency units invested.
    pub fn investment_points(amount: f64) -> i32 {
        (amount / 10.0).floor() as i32
    }

    /// Append a ledger row and keep the user's running total in step.
    pub async fn award_points(
        &self,
        user_id: ObjectId,
        points: i32,
        points_type: PointsType,
        description: impl Into<String>,
        reference_type: Option<PointsReference>,
        reference_id: Option<ObjectId>,
    ) -> Result<()> {
        if points == 0 {
            return Ok(());
        }

        let ledger: Collection<PointsTransaction> = self.db.collection("points_transactions");
        ledger
            .insert_one(&PointsTransaction {
                _id: Some(ObjectId::new()),
                user_id,
                points,
                points_type,
                description: Some(description.into()),
                reference_type,
                reference_id,
                created_at: Utc::now(),
            })
            .await?;

        let users: Collection<User> = self.db.collection("users");
        users
            .update_one(
                doc! { "_id": user_id },
                doc! { "$inc": { "total_points": points } },
            )
            .await?;

        Ok(())
    }

    /// Sum of principal over the user's active and matured positions.
    /// Withdrawn and cancelled positions no longer count toward the tier.
    pub async fn total_invested(&self, user_id: ObjectId) -> Result<f64> {
        let investments: Collection<mongodb::bson::Document> =
            self.db.collection("user_investments");

        let pipeline = vec![
            doc! { "$match": {
                "user_id": user_id,
                "status": { "$in": ["active", "matured"] },
            }},
            doc! { "$group": { "_id": null, "total": { "$sum": "$amount" } } },
        ];

        let mut cursor = investments.aggregate(pipeline).await?;
        if let Some(result) = cursor.try_next().await? {
            Ok(result.get_f64("total").unwrap_or(0.0))
        } else {
            Ok(0.0)
        }
    }

    /// Recompute the loyalty level and persist it if it changed. The
    /// stored level is a cache of the classifier's output, refreshed here
    /// after every mutation of the user's positions.
    pub async fn recalculate_level(&self, user_id: ObjectId) -> Result<Tier> {
        let total = self.total_invested(user_id).await?;
        let new_level = classify_tier(total, &self.thresholds);

        let users: Collection<User> = self.db.collection("users");
        let user = users
            .find_one(doc! { "_id": user_id })
            .await?
            .ok_or(AppError::UserNotFound)?;

        if user.level != new_level {
            users
                .update_one(
                    doc! { "_id": user_id },
                    doc! { "$set": {
                        "level": new_level.as_str(),
                        "updated_at": BsonDateTime::now(),
                    }},
                )
                .await?;
            tracing::info!(
                "User {} level changed: {} -> {} (total invested {:.2})",
                user_id.to_hex(),
                user.level,
                new_level,
                total
            );
        }

        Ok(new_level)
    }

    /// Update login streaks and award the daily login points. Only the
    /// first login of a calendar day counts.
    pub async fn record_login(&self, user: &User, now: DateTime<Utc>) -> Result<(i32, i32)> {
        let user_id = user._id.ok_or(AppError::UserNotFound)?;
        let today = now.date_naive();

        let last_login_date = user
            .last_login
            .and_then(|ts| DateTime::<Utc>::from_timestamp_millis(ts.timestamp_millis()))
            .map(|dt| dt.date_naive());

        if last_login_date == Some(today) {
            return Ok((user.current_streak, user.longest_streak));
        }

        let continues_streak = today
            .pred_opt()
            .map(|yesterday| last_login_date == Some(yesterday))
            .unwrap_or(false);
        let current_streak = if continues_streak {
            user.current_streak + 1
        } else {
            1
        };
        let longest_streak = user.longest_streak.max(current_streak);

        let users: Collection<User> = self.db.collection("users");
        users
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": {
                    "last_login": BsonDateTime::from_millis(now.timestamp_millis()),
                    "current_streak": current_streak,
                    "longest_streak": longest_streak,
                    "updated_at": BsonDateTime::from_millis(now.timestamp_millis()),
                }},
            )
            .await?;

        self.award_points(
            user_id,
            DAILY_LOGIN_POINTS,
            PointsType::Earned,
            format!("Daily login (streak: {})", current_streak),
            Some(PointsReference::DailyLogin),
            None,
        )
        .await?;

        Ok((current_streak, longest_streak))
    }

    /// Complete the pending referral pointing at this user, if any, and
    /// grant the referrer their reward. Called on the referred user's
    /// first investment; a no-op otherwise.
    pub async fn complete_referral_for(
        &self,
        referred_id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let referrals: Collection<Referral> = self.db.collection("referrals");

        let referral = match referrals
            .find_one(doc! { "referred_id": referred_id, "status": "pending" })
            .await?
        {
            Some(referral) => referral,
            None => return Ok(()),
        };

        let referral_id = referral._id.ok_or(AppError::ServiceError(
            "referral document missing _id".to_string(),
        ))?;

        referrals
            .update_one(
                doc! { "_id": referral_id },
                doc! { "$set": {
                    "status": "completed",
                    "reward_granted": true,
                    "completed_at": BsonDateTime::from_millis(now.timestamp_millis()),
                    "updated_at": BsonDateTime::from_millis(now.timestamp_millis()),
                }},
            )
            .await?;

        self.award_points(
            referral.referrer_id,
            referral.reward_points,
            PointsType::Bonus,
            "Referral completed".to_string(),
            Some(PointsReference::Referral),
            Some(referral_id),
        )
        .await?;

        tracing::info!(
            "Referral {} completed, {} points to referrer {}",
            referral_id.to_hex(),
            referral.reward_points,
            referral.referrer_id.to_hex()
        );

        Ok(())
    }

    /// Register a pending referral for a freshly signed-up user when the
    /// supplied code matches an existing user. An unknown code is ignored
    /// rather than failing the signup.
    pub async fn apply_referral_code(
        &self,
        code: &str,
        referred_id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let users: Collection<User> = self.db.collection("users");
        let referrer = match users.find_one(doc! { "referral_code": code }).await? {
            Some(referrer) => referrer,
            None => {
                tracing::warn!("Signup supplied unknown referral code {}", code);
                return Ok(false);
            }
        };

        let referrer_id = referrer._id.ok_or(AppError::UserNotFound)?;
        if referrer_id == referred_id {
            return Ok(false);
        }

        let referrals: Collection<Referral> = self.db.collection("referrals");
        referrals
            .insert_one(&Referral::pending(
                referrer_id,
                referred_id,
                code.to_string(),
                self.referral_reward_points,
                now,
            ))
            .await?;

        Ok(true)
    }

    /// Evaluate every active achievement the user has not unlocked yet
    /// and unlock the ones whose criteria now hold. Returns the newly
    /// unlocked achievements.
    pub async fn check_achievements(
        &self,
        user_id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Achievement>> {
        let users: Collection<User> = self.db.collection("users");
        let user = users
            .find_one(doc! { "_id": user_id })
            .await?
            .ok_or(AppError::UserNotFound)?;

        let investments: Collection<mongodb::bson::Document> =
            self.db.collection("user_investments");
        let investment_count = investments
            .count_documents(doc! { "user_id": user_id, "status": { "$ne": "cancelled" } })
            .await? as i64;
        let total_invested = self.total_invested(user_id).await?;

        let unlocked: Collection<UserAchievement> = self.db.collection("user_achievements");
        let mut cursor = unlocked.find(doc! { "user_id": user_id }).await?;
        let mut already: HashSet<ObjectId> = HashSet::new();
        while let Some(entry) = cursor.try_next().await? {
            already.insert(entry.achievement_id);
        }

        let achievements: Collection<Achievement> = self.db.collection("achievements");
        let candidates: Vec<Achievement> = achievements
            .find(doc! { "is_active": true })
            .await?
            .try_collect()
            .await?;

        let mut newly_unlocked = Vec::new();
        for achievement in candidates {
            let achievement_id = match achievement._id {
                Some(id) if !already.contains(&id) => id,
                _ => continue,
            };

            let satisfied = match &achievement.criteria {
                AchievementCriteria::InvestmentCount { threshold } => {
                    investment_count >= *threshold
                }
                AchievementCriteria::TotalInvested { threshold } => total_invested >= *threshold,
                AchievementCriteria::LoginStreak { threshold } => {
                    user.current_streak >= *threshold
                }
                AchievementCriteria::Level { level } => user.level >= *level,
            };
            if !satisfied {
                continue;
            }

            unlocked
                .insert_one(&UserAchievement {
                    _id: Some(ObjectId::new()),
                    user_id,
                    achievement_id,
                    unlocked_at: BsonDateTime::from_millis(now.timestamp_millis()),
                })
                .await?;

            if achievement.points_reward > 0 {
                self.award_points(
                    user_id,
                    achievement.points_reward,
                    PointsType::Bonus,
                    format!("Achievement unlocked: {}", achievement.name),
                    Some(PointsReference::Achievement),
                    Some(achievement_id),
                )
                .await?;
            }

            tracing::info!(
                "User {} unlocked achievement '{}'",
                user_id.to_hex(),
                achievement.name
            );
            newly_unlocked.push(achievement);
        }

        Ok(newly_unlocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn investment_points_floor_to_whole_points() {
        assert_eq!(GamificationService::investment_points(0.0), 0);
        assert_eq!(GamificationService::investment_points(99.0), 9);
        assert_eq!(GamificationService::investment_points(100.0), 10);
        assert_eq!(GamificationService::investment_points(1005.0), 100);
    }
}
