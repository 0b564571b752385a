use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointsType {
    Earned,
    Redeemed,
    Bonus,
    Penalty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsReference {
    Investment,
    LoginStreak,
    Referral,
    Achievement,
    DailyLogin,
}

/// One row in the append-only points ledger. The user's `total_points`
/// is the running sum, incremented in the same write batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsTransaction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub points: i32,
    #[serde(rename = "type")]
    pub points_type: PointsType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<PointsReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<ObjectId>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}
