use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Savings,
    Bonds,
    Stocks,
    MutualFunds,
    FixedDeposit,
    Other,
}

/// A fixed-rate offering. The rate here is only the rate for *new*
/// positions; each investment locks its own copy at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentProduct {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Annual interest rate percentage.
    pub interest_rate: f64,
    pub minimum_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_amount: Option<f64>,
    pub lock_in_period_days: i64,
    pub risk_level: RiskLevel,
    pub category: ProductCategory,
    pub is_active: bool,
    pub total_invested: f64,
    pub total_investors: i64,
    #[serde(default)]
    pub features: Vec<String>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(length(min = 3, message = "Product name must be at least 3 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0, max = 100.0, message = "Interest rate must be between 0 and 100"))]
    pub interest_rate: f64,
    #[validate(range(min = 1.0, message = "Minimum amount must be positive"))]
    pub minimum_amount: f64,
    pub maximum_amount: Option<f64>,
    #[validate(range(min = 0, message = "Lock-in period cannot be negative"))]
    pub lock_in_period_days: i64,
    pub risk_level: RiskLevel,
    pub category: ProductCategory,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub interest_rate: Option<f64>,
    pub minimum_amount: Option<f64>,
    pub maximum_amount: Option<f64>,
    pub lock_in_period_days: Option<i64>,
    pub is_active: Option<bool>,
    pub features: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<ProductCategory>,
    pub risk_level: Option<RiskLevel>,
    pub include_inactive: Option<bool>,
}
