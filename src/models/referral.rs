use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Completed,
    Expired,
}

/// Created pending at signup when a valid code is supplied; completed
/// (and the referrer rewarded) on the referred user's first investment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub referrer_id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_id: Option<ObjectId>,
    pub referral_code: String,
    pub status: ReferralStatus,
    pub reward_points: i32,
    pub reward_granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<bson::DateTime>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Referral {
    pub fn pending(
        referrer_id: ObjectId,
        referred_id: ObjectId,
        referral_code: String,
        reward_points: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Referral {
            _id: Some(ObjectId::new()),
            referrer_id,
            referred_id: Some(referred_id),
            referral_code,
            status: ReferralStatus::Pending,
            reward_points,
            reward_granted: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
