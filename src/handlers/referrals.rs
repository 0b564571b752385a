use axum::{
    extract::State,
    response::Json,
    Extension,
};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Collection;
use serde::Serialize;

use crate::errors::{AppError, Result};
use crate::models::referral::Referral;
use crate::models::user::{Claims, User};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReferralOverview {
    pub referral_code: String,
    pub total_referred: usize,
    pub completed: usize,
    pub points_earned: i32,
    pub referrals: Vec<Referral>,
}

// My referral code and everyone I've brought in
pub async fn get_referrals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ReferralOverview>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;

    let users: Collection<User> = state.db.collection("users");
    let user = users
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or(AppError::UserNotFound)?;

    let collection: Collection<Referral> = state.db.collection("referrals");
    let cursor = collection.find(doc! { "referrer_id": user_id }).await?;
    let mut referrals: Vec<Referral> = cursor.try_collect().await?;
    referrals.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let completed = referrals.iter().filter(|r| r.reward_granted).count();
    let points_earned: i32 = referrals
        .iter()
        .filter(|r| r.reward_granted)
        .map(|r| r.reward_points)
        .sum();

    Ok(Json(ReferralOverview {
        referral_code: user.referral_code,
        total_referred: referrals.len(),
        completed,
        points_earned,
        referrals,
    }))
}
