use chrono::{DateTime, Duration, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::growth::{calculate_current_value, ValueBreakdown, ValueSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentStatus {
    Active,
    Matured,
    Withdrawn,
    Cancelled,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStatus::Active => "active",
            InvestmentStatus::Matured => "matured",
            InvestmentStatus::Withdrawn => "withdrawn",
            InvestmentStatus::Cancelled => "cancelled",
        }
    }
}

/// A user's position in a product. `current_value` and `profit` are never
/// stored; they are recomputed from the locked rate on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInvestment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub product_id: ObjectId,
    /// Principal amount.
    pub amount: f64,
    /// Annual rate percentage locked at the time of investment.
    pub interest_rate: f64,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub maturity_date: DateTime<Utc>,

    pub status: InvestmentStatus,
    pub auto_reinvest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawn_at: Option<bson::DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawn_amount: Option<f64>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl UserInvestment {
    pub fn new(
        user_id: ObjectId,
        product_id: ObjectId,
        amount: f64,
        interest_rate: f64,
        lock_in_period_days: i64,
        auto_reinvest: bool,
        now: DateTime<Utc>,
    ) -> Self {
        UserInvestment {
            _id: Some(ObjectId::new()),
            user_id,
            product_id,
            amount,
            interest_rate,
            start_date: now,
            maturity_date: now + Duration::days(lock_in_period_days),
            status: InvestmentStatus::Active,
            auto_reinvest,
            withdrawn_at: None,
            withdrawn_amount: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn value_at(&self, as_of: DateTime<Utc>) -> ValueBreakdown {
        calculate_current_value(self.amount, self.interest_rate, self.start_date, as_of)
    }

    pub fn is_mature(&self, as_of: DateTime<Utc>) -> bool {
        as_of >= self.maturity_date
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvestment {
    pub product_id: String,
    #[validate(range(min = 1.0, message = "Investment amount must be positive"))]
    pub amount: f64,
    #[serde(default)]
    pub auto_reinvest: bool,
}

#[derive(Debug, Deserialize)]
pub struct InvestmentQuery {
    pub status: Option<InvestmentStatus>,
}

/// Position plus its freshly computed value, as returned to clients.
#[derive(Debug, Serialize)]
pub struct InvestmentResponse {
    pub id: String,
    pub product_id: String,
    pub amount: f64,
    pub interest_rate: f64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub maturity_date: DateTime<Utc>,
    pub status: InvestmentStatus,
    pub auto_reinvest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawn_amount: Option<f64>,
    pub value: ValueSnapshot,
}

impl InvestmentResponse {
    pub fn from_investment(investment: &UserInvestment, as_of: DateTime<Utc>) -> Self {
        InvestmentResponse {
            id: investment._id.map(|id| id.to_hex()).unwrap_or_default(),
            product_id: investment.product_id.to_hex(),
            amount: investment.amount,
            interest_rate: investment.interest_rate,
            start_date: investment.start_date,
            maturity_date: investment.maturity_date,
            status: investment.status,
            auto_reinvest: investment.auto_reinvest,
            withdrawn_amount: investment.withdrawn_amount,
            value: investment.value_at(as_of).snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maturity_is_start_plus_lock_in() {
        let now = Utc::now();
        let investment = UserInvestment::new(
            ObjectId::new(),
            ObjectId::new(),
            500.0,
            10.0,
            90,
            false,
            now,
        );

        assert_eq!(investment.maturity_date, now + Duration::days(90));
        assert_eq!(investment.status, InvestmentStatus::Active);
        assert!(!investment.is_mature(now));
        assert!(investment.is_mature(now + Duration::days(90)));
    }

    #[test]
    fn value_is_computed_from_locked_rate() {
        let now = Utc::now();
        let mut investment = UserInvestment::new(
            ObjectId::new(),
            ObjectId::new(),
            1000.0,
            36.5,
            365,
            false,
            now - Duration::days(100),
        );
        // The product rate changing later must not affect this position.
        investment.interest_rate = 36.5;

        let snapshot = investment.value_at(now).snapshot();
        assert_eq!(snapshot.days_since_start, 100);
        assert_eq!(snapshot.profit, "100.00");
        assert_eq!(snapshot.current_value, "1100.00");
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&InvestmentStatus::Withdrawn).unwrap(),
            "\"withdrawn\""
        );
        assert_eq!(InvestmentStatus::Matured.as_str(), "matured");
    }
}
