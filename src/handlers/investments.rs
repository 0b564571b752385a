use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::Collection;
use serde::Serialize;
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::investment::{
    CreateInvestment, InvestmentQuery, InvestmentResponse, InvestmentStatus, UserInvestment,
};
use crate::models::product::InvestmentProduct;
use crate::models::points::{PointsReference, PointsType};
use crate::models::transaction::{Transaction, TransactionType};
use crate::models::user::Claims;
use crate::services::gamification::GamificationService;
use crate::services::growth::ValueSnapshot;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub success: bool,
    pub message: String,
    pub withdrawn_amount: f64,
    pub value: ValueSnapshot,
    pub transaction_reference: String,
}

// Open a new position, locking the product's current rate
pub async fn create_investment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateInvestment>,
) -> Result<Json<InvestmentResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let user_id = ObjectId::parse_str(&claims.sub)?;
    let product_id = ObjectId::parse_str(&payload.product_id)?;

    let products: Collection<InvestmentProduct> = state.db.collection("investment_products");
    let product = products
        .find_one(doc! { "_id": product_id, "is_active": true })
        .await?
        .ok_or(AppError::ProductNotFound)?;

    if payload.amount < product.minimum_amount {
        return Err(AppError::invalid_data(format!(
            "Minimum investment for {} is {:.2}",
            product.name, product.minimum_amount
        )));
    }
    if let Some(maximum) = product.maximum_amount {
        if payload.amount > maximum {
            return Err(AppError::invalid_data(format!(
                "Maximum investment for {} is {:.2}",
                product.name, maximum
            )));
        }
    }

    let now = Utc::now();
    let investment = UserInvestment::new(
        user_id,
        product_id,
        payload.amount,
        product.interest_rate,
        product.lock_in_period_days,
        payload.auto_reinvest,
        now,
    );

    let investments: Collection<UserInvestment> = state.db.collection("user_investments");
    investments.insert_one(&investment).await?;
    let investment_id = investment._id.expect("freshly created investment has an id");

    products
        .update_one(
            doc! { "_id": product_id },
            doc! {
                "$inc": { "total_invested": payload.amount, "total_investors": 1_i64 },
                "$set": { "updated_at": BsonDateTime::now() },
            },
        )
        .await?;

    let transactions: Collection<Transaction> = state.db.collection("transactions");
    transactions
        .insert_one(&Transaction::completed(
            user_id,
            Some(investment_id),
            TransactionType::Investment,
            payload.amount,
            format!("Investment in {}", product.name),
            now,
        ))
        .await?;

    state
        .gamification
        .award_points(
            user_id,
            GamificationService::investment_points(payload.amount),
            PointsType::Earned,
            format!("Invested {:.2} in {}", payload.amount, product.name),
            Some(PointsReference::Investment),
            Some(investment_id),
        )
        .await?;

    // A pending referral completes on the referred user's first
    // investment; later calls are no-ops.
    state
        .gamification
        .complete_referral_for(user_id, now)
        .await?;

    let new_level = state.gamification.recalculate_level(user_id).await?;
    state.gamification.check_achievements(user_id, now).await?;

    tracing::info!(
        "💰 User {} invested {:.2} in {} at {:.2}% (level: {})",
        user_id.to_hex(),
        payload.amount,
        product.name,
        product.interest_rate,
        new_level
    );

    Ok(Json(InvestmentResponse::from_investment(&investment, now)))
}

// List my positions, each with its freshly computed value
pub async fn get_investments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<InvestmentQuery>,
) -> Result<Json<Vec<InvestmentResponse>>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;
    let collection: Collection<UserInvestment> = state.db.collection("user_investments");

    let mut filter = doc! { "user_id": user_id };
    if let Some(status) = &query.status {
        filter.insert("status", bson::to_bson(status)?);
    }

    let cursor = collection.find(filter).await?;
    let mut investments: Vec<UserInvestment> = cursor.try_collect().await?;
    investments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let now = Utc::now();
    let mut responses = Vec::with_capacity(investments.len());
    for mut investment in investments {
        mark_matured(&collection, &mut investment, now).await?;

        let breakdown = investment.value_at(now);
        if breakdown.days_since_start < 0 {
            tracing::warn!(
                "Investment {} has a start date in the future; reporting negative profit",
                investment._id.map(|id| id.to_hex()).unwrap_or_default()
            );
        }
        responses.push(InvestmentResponse::from_investment(&investment, now));
    }

    Ok(Json(responses))
}

pub async fn get_investment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<InvestmentResponse>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;
    let investment_id = ObjectId::parse_str(&id)?;

    let collection: Collection<UserInvestment> = state.db.collection("user_investments");
    let mut investment = collection
        .find_one(doc! { "_id": investment_id })
        .await?
        .ok_or(AppError::InvestmentNotFound)?;

    if investment.user_id != user_id && !claims.is_admin() {
        return Err(AppError::Unauthorized);
    }

    let now = Utc::now();
    mark_matured(&collection, &mut investment, now).await?;

    Ok(Json(InvestmentResponse::from_investment(&investment, now)))
}

// Withdraw a position after its lock-in has elapsed
pub async fn withdraw_investment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<WithdrawResponse>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;
    let investment_id = ObjectId::parse_str(&id)?;

    let collection: Collection<UserInvestment> = state.db.collection("user_investments");
    let investment = collection
        .find_one(doc! { "_id": investment_id })
        .await?
        .ok_or(AppError::InvestmentNotFound)?;

    if investment.user_id != user_id {
        return Err(AppError::Unauthorized);
    }
    if !matches!(
        investment.status,
        InvestmentStatus::Active | InvestmentStatus::Matured
    ) {
        return Err(AppError::invalid_data("Investment is already closed"));
    }

    let now = Utc::now();
    if !investment.is_mature(now) {
        return Err(AppError::LockInActive);
    }

    let breakdown = investment.value_at(now);
    let withdrawn_amount = (breakdown.current_value * 100.0).round() / 100.0;

    collection
        .update_one(
            doc! { "_id": investment_id },
            doc! { "$set": {
                "status": InvestmentStatus::Withdrawn.as_str(),
                "withdrawn_at": BsonDateTime::from_millis(now.timestamp_millis()),
                "withdrawn_amount": withdrawn_amount,
                "updated_at": BsonDateTime::from_millis(now.timestamp_millis()),
            }},
        )
        .await?;

    let transaction = Transaction::completed(
        user_id,
        Some(investment_id),
        TransactionType::Withdrawal,
        withdrawn_amount,
        "Investment withdrawal".to_string(),
        now,
    );
    let transactions: Collection<Transaction> = state.db.collection("transactions");
    transactions.insert_one(&transaction).await?;

    // Withdrawn principal no longer counts toward the loyalty level.
    state.gamification.recalculate_level(user_id).await?;

    tracing::info!(
        "🏦 User {} withdrew {:.2} from investment {}",
        user_id.to_hex(),
        withdrawn_amount,
        investment_id.to_hex()
    );

    Ok(Json(WithdrawResponse {
        success: true,
        message: "Investment withdrawn successfully".to_string(),
        withdrawn_amount,
        value: breakdown.snapshot(),
        transaction_reference: transaction.reference,
    }))
}

/// Flip an active position to matured once its maturity date passes.
/// Both statuses count toward the tier, so no level recompute is needed.
async fn mark_matured(
    collection: &Collection<UserInvestment>,
    investment: &mut UserInvestment,
    now: chrono::DateTime<Utc>,
) -> Result<()> {
    if investment.status == InvestmentStatus::Active && investment.is_mature(now) {
        let investment_id = investment._id.ok_or(AppError::InvestmentNotFound)?;
        collection
            .update_one(
                doc! { "_id": investment_id },
                doc! { "$set": {
                    "status": InvestmentStatus::Matured.as_str(),
                    "updated_at": BsonDateTime::from_millis(now.timestamp_millis()),
                }},
            )
            .await?;
        investment.status = InvestmentStatus::Matured;
    }
    Ok(())
}
