use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId};
use mongodb::Collection;

use crate::errors::{AppError, Result};
use crate::models::transaction::{Transaction, TransactionQuery};
use crate::models::user::Claims;
use crate::state::AppState;

// List my transactions, newest first
pub async fn get_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;
    let collection: Collection<Transaction> = state.db.collection("transactions");

    let mut filter = doc! { "user_id": user_id };
    if let Some(transaction_type) = &query.transaction_type {
        filter.insert("type", bson::to_bson(transaction_type)?);
    }
    if let Some(status) = &query.status {
        filter.insert("status", bson::to_bson(status)?);
    }

    let cursor = collection.find(filter).await?;
    let mut transactions: Vec<Transaction> = cursor.try_collect().await?;
    transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(transactions))
}

// Look a transaction up by its quotable reference
pub async fn get_transaction_by_reference(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reference): Path<String>,
) -> Result<Json<Transaction>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;
    let collection: Collection<Transaction> = state.db.collection("transactions");

    let transaction = collection
        .find_one(doc! { "reference": &reference })
        .await?
        .ok_or(AppError::TransactionNotFound)?;

    if transaction.user_id != user_id && !claims.is_admin() {
        return Err(AppError::Unauthorized);
    }

    Ok(Json(transaction))
}
