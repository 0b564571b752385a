use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Loyalty level derived from cumulative invested principal. Ordering is
/// meaningful: `Bronze < Silver < Gold < Platinum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Admin,
    SuperAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_hash: Option<String>,
    pub kyc_status: KycStatus,

    // Gamification fields
    pub level: Tier,
    pub total_points: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<bson::DateTime>,

    pub role: UserRole,
    pub is_active: bool,
    pub referral_code: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// `MN`-prefixed referral code derived from the creation instant, the
    /// same base-36 shape the mobile client expects.
    pub fn generate_referral_code(now: DateTime<Utc>) -> String {
        format!("MN{}", to_base36(now.timestamp_millis()).to_uppercase())
    }
}

fn to_base36(mut value: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub phone_number: String,
    pub full_name: String,
    pub level: Tier,
    pub total_points: i32,
    pub current_streak: i32,
    pub referral_code: String,
    pub kyc_status: KycStatus,
    pub has_pin: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user._id.map(|id| id.to_hex()).unwrap_or_default(),
            phone_number: user.phone_number.clone(),
            full_name: user.full_name.clone(),
            level: user.level,
            total_points: user.total_points,
            current_streak: user.current_streak,
            referral_code: user.referral_code.clone(),
            kyc_status: user.kyc_status,
            has_pin: user.pin_hash.is_some(),
        }
    }
}

/// Access-token claims carried through the auth middleware.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub phone_number: String,
    pub role: UserRole,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::SuperAdmin)
    }
}

/// Refresh tokens carry only the subject.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tiers_order_from_bronze_to_platinum() {
        assert!(Tier::Bronze < Tier::Silver);
        assert!(Tier::Silver < Tier::Gold);
        assert!(Tier::Gold < Tier::Platinum);
    }

    #[test]
    fn tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Gold).unwrap(), "\"gold\"");
    }

    #[test]
    fn referral_codes_are_prefixed_and_unique_per_instant() {
        let a = User::generate_referral_code(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap());
        let b = User::generate_referral_code(Utc.timestamp_millis_opt(1_700_000_000_001).unwrap());
        assert!(a.starts_with("MN"));
        assert_ne!(a, b);
    }

    #[test]
    fn base36_round_trip_known_value() {
        // 36^2 = 1296 -> "100"
        assert_eq!(to_base36(1296), "100");
        assert_eq!(to_base36(35), "z");
    }
}
