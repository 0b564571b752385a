use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Investment,
    Interest,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment_id: Option<ObjectId>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub status: TransactionStatus,
    /// Unique, human-quotable reference.
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fee: f64,
    pub net_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<bson::DateTime>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn completed(
        user_id: ObjectId,
        investment_id: Option<ObjectId>,
        transaction_type: TransactionType,
        amount: f64,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Transaction {
            _id: Some(ObjectId::new()),
            user_id,
            investment_id,
            transaction_type,
            amount,
            status: TransactionStatus::Completed,
            reference: Self::generate_reference(),
            description: Some(description.into()),
            fee: 0.0,
            net_amount: amount,
            processed_at: Some(bson::DateTime::from_millis(now.timestamp_millis())),
            created_at: now,
        }
    }

    pub fn generate_reference() -> String {
        format!("MN-{}", Uuid::new_v4().simple())
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_prefixed_and_distinct() {
        let a = Transaction::generate_reference();
        let b = Transaction::generate_reference();
        assert!(a.starts_with("MN-"));
        assert_ne!(a, b);
    }

    #[test]
    fn completed_transaction_carries_net_amount() {
        let now = Utc::now();
        let txn = Transaction::completed(
            ObjectId::new(),
            None,
            TransactionType::Investment,
            250.0,
            "Investment in Treasury Savings",
            now,
        );
        assert_eq!(txn.status, TransactionStatus::Completed);
        assert_eq!(txn.net_amount, 250.0);
        assert_eq!(txn.fee, 0.0);
        assert!(txn.processed_at.is_some());
    }
}
