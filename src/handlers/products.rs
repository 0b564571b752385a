use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::Collection;
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::product::{CreateProduct, InvestmentProduct, ProductQuery, UpdateProduct};
use crate::models::user::Claims;
use crate::state::AppState;

// List products, active only unless an admin asks otherwise
pub async fn get_products(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<InvestmentProduct>>> {
    let collection: Collection<InvestmentProduct> = state.db.collection("investment_products");

    let mut filter = doc! {};
    let include_inactive = query.include_inactive.unwrap_or(false) && claims.is_admin();
    if !include_inactive {
        filter.insert("is_active", true);
    }
    if let Some(category) = &query.category {
        filter.insert("category", bson::to_bson(category)?);
    }
    if let Some(risk_level) = &query.risk_level {
        filter.insert("risk_level", bson::to_bson(risk_level)?);
    }

    let cursor = collection.find(filter).await?;
    let mut products: Vec<InvestmentProduct> = cursor.try_collect().await?;
    products.sort_by(|a, b| b.interest_rate.partial_cmp(&a.interest_rate).unwrap_or(std::cmp::Ordering::Equal));

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvestmentProduct>> {
    let product_id = ObjectId::parse_str(&id)?;
    let collection: Collection<InvestmentProduct> = state.db.collection("investment_products");

    let product = collection
        .find_one(doc! { "_id": product_id })
        .await?
        .ok_or(AppError::ProductNotFound)?;

    Ok(Json(product))
}

// Create a product (admin only)
pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProduct>,
) -> Result<Json<InvestmentProduct>> {
    if !claims.is_admin() {
        return Err(AppError::Unauthorized);
    }
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    if let Some(maximum) = payload.maximum_amount {
        if maximum < payload.minimum_amount {
            return Err(AppError::invalid_data(
                "Maximum amount cannot be below the minimum amount",
            ));
        }
    }

    let now = Utc::now();
    let product = InvestmentProduct {
        _id: Some(ObjectId::new()),
        name: payload.name.clone(),
        description: payload.description.clone(),
        interest_rate: payload.interest_rate,
        minimum_amount: payload.minimum_amount,
        maximum_amount: payload.maximum_amount,
        lock_in_period_days: payload.lock_in_period_days,
        risk_level: payload.risk_level,
        category: payload.category,
        is_active: true,
        total_invested: 0.0,
        total_investors: 0,
        features: payload.features.clone(),
        created_at: now,
        updated_at: now,
    };

    let collection: Collection<InvestmentProduct> = state.db.collection("investment_products");
    collection.insert_one(&product).await?;

    tracing::info!("📦 Product created: {} ({:.2}% APR)", product.name, product.interest_rate);
    Ok(Json(product))
}

// Update a product (admin only). Rate changes never touch existing
// positions, which carry their own locked rate.
pub async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProduct>,
) -> Result<Json<InvestmentProduct>> {
    if !claims.is_admin() {
        return Err(AppError::Unauthorized);
    }

    let product_id = ObjectId::parse_str(&id)?;

    let mut set = doc! { "updated_at": BsonDateTime::now() };
    if let Some(name) = payload.name {
        set.insert("name", name);
    }
    if let Some(description) = payload.description {
        set.insert("description", description);
    }
    if let Some(interest_rate) = payload.interest_rate {
        if !(0.0..=100.0).contains(&interest_rate) {
            return Err(AppError::invalid_data("Interest rate must be between 0 and 100"));
        }
        set.insert("interest_rate", interest_rate);
    }
    if let Some(minimum_amount) = payload.minimum_amount {
        set.insert("minimum_amount", minimum_amount);
    }
    if let Some(maximum_amount) = payload.maximum_amount {
        set.insert("maximum_amount", maximum_amount);
    }
    if let Some(lock_in_period_days) = payload.lock_in_period_days {
        set.insert("lock_in_period_days", lock_in_period_days);
    }
    if let Some(is_active) = payload.is_active {
        set.insert("is_active", is_active);
    }
    if let Some(features) = payload.features {
        set.insert("features", features);
    }

    let collection: Collection<InvestmentProduct> = state.db.collection("investment_products");
    let result = collection
        .update_one(doc! { "_id": product_id }, doc! { "$set": set })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::ProductNotFound);
    }

    let product = collection
        .find_one(doc! { "_id": product_id })
        .await?
        .ok_or(AppError::ProductNotFound)?;

    Ok(Json(product))
}
