use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::Collection;
use validator::Validate;

use crate::config::AppConfig;
use crate::dtos::auth_dtos::{
    AuthResponse, OtpPurpose, PinLoginRequest, RefreshTokenRequest, RefreshTokenResponse,
    RequestOtpRequest, RequestOtpResponse, SetPinRequest, SetPinResponse, VerifyOtpRequest,
    VerifyOtpResponse,
};
use crate::errors::{AppError, Result};
use crate::models::user::{Claims, KycStatus, RefreshClaims, Tier, User, UserResponse, UserRole};
use crate::services::otp_store::OtpStore;
use crate::state::AppState;

// 1. Request OTP for login or signup
pub async fn request_otp(
    State(state): State<AppState>,
    Json(req): Json<RequestOtpRequest>,
) -> impl IntoResponse {
    if let Err(errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(RequestOtpResponse {
                success: false,
                message: format!("Validation error: {}", errors),
            }),
        )
            .into_response();
    }

    // Housekeeping: codes that were never verified would otherwise sit in
    // the table until their key is touched again.
    state.otp_store.purge_expired();

    let users: Collection<User> = state.db.collection("users");
    let existing = match users
        .find_one(doc! { "phone_number": &req.phone_number })
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Database error: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RequestOtpResponse {
                    success: false,
                    message: "Database error".to_string(),
                }),
            )
                .into_response();
        }
    };

    match req.purpose {
        OtpPurpose::Login => {
            let active = existing.as_ref().map(|u| u.is_active).unwrap_or(false);
            if !active {
                return (
                    StatusCode::NOT_FOUND,
                    Json(RequestOtpResponse {
                        success: false,
                        message: "No active account for this phone number".to_string(),
                    }),
                )
                    .into_response();
            }
        }
        OtpPurpose::Signup => {
            if existing.is_some() {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(RequestOtpResponse {
                        success: false,
                        message: "Phone number already registered".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    }

    let code = OtpStore::generate_code();
    state
        .otp_store
        .store(&req.phone_number, req.purpose.as_str(), &code);

    if let Err(e) = state
        .sms_service
        .send_otp(&req.phone_number, &code, state.config.otp_expiry_minutes)
        .await
    {
        tracing::error!("Failed to send SMS: {}", e);
    }

    (
        StatusCode::OK,
        Json(RequestOtpResponse {
            success: true,
            message: "OTP sent to your phone".to_string(),
        }),
    )
        .into_response()
}

// 2. Verify OTP, creating the account on signup and issuing tokens
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> impl IntoResponse {
    if let Err(errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(VerifyOtpResponse::failure(
                format!("Validation error: {}", errors),
                None,
            )),
        )
            .into_response();
    }

    let outcome = state
        .otp_store
        .verify(&req.phone_number, req.purpose.as_str(), &req.otp);

    if !outcome.is_success() {
        return (
            StatusCode::BAD_REQUEST,
            Json(VerifyOtpResponse::failure(
                outcome.message(),
                outcome.attempts_left(),
            )),
        )
            .into_response();
    }

    let result = match req.purpose {
        OtpPurpose::Signup => complete_signup(&state, &req).await,
        OtpPurpose::Login => complete_login(&state, &req.phone_number).await,
    };

    match result {
        Ok((user, token, refresh_token)) => (
            StatusCode::OK,
            Json(VerifyOtpResponse {
                success: true,
                message: "OTP verified successfully".to_string(),
                attempts_left: None,
                token: Some(token),
                refresh_token: Some(refresh_token),
                user: Some(UserResponse::from(&user)),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Post-verification failure: {}", e);
            e.into_response()
        }
    }
}

async fn complete_signup(state: &AppState, req: &VerifyOtpRequest) -> Result<(User, String, String)> {
    let full_name = req
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| name.len() >= 2)
        .ok_or_else(|| AppError::invalid_data("Full name is required for signup"))?;

    let users: Collection<User> = state.db.collection("users");
    if users
        .find_one(doc! { "phone_number": &req.phone_number })
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateKey);
    }

    let now = Utc::now();
    let user = User {
        _id: Some(ObjectId::new()),
        phone_number: req.phone_number.clone(),
        email: req.email.clone(),
        full_name: full_name.to_string(),
        pin_hash: None,
        kyc_status: KycStatus::Pending,
        level: Tier::Bronze,
        total_points: 0,
        current_streak: 0,
        longest_streak: 0,
        last_login: Some(BsonDateTime::from_millis(now.timestamp_millis())),
        role: UserRole::Customer,
        is_active: true,
        referral_code: User::generate_referral_code(now),
        created_at: now,
        updated_at: now,
    };

    users.insert_one(&user).await?;
    let user_id = user._id.expect("freshly created user has an id");
    tracing::info!("👤 New user registered: {}", user_id.to_hex());

    if let Some(code) = req.referral_code.as_deref().filter(|c| !c.is_empty()) {
        state
            .gamification
            .apply_referral_code(code, user_id, now)
            .await?;
    }

    let token = issue_access_token(&user, &state.config)?;
    let refresh_token = issue_refresh_token(&user_id, &state.config)?;
    Ok((user, token, refresh_token))
}

async fn complete_login(state: &AppState, phone_number: &str) -> Result<(User, String, String)> {
    let users: Collection<User> = state.db.collection("users");
    let user = users
        .find_one(doc! { "phone_number": phone_number })
        .await?
        .ok_or(AppError::UserNotFound)?;

    if !user.is_active {
        return Err(AppError::Unauthorized);
    }

    let user_id = user._id.ok_or(AppError::UserNotFound)?;
    let (current_streak, longest_streak) =
        state.gamification.record_login(&user, Utc::now()).await?;

    let token = issue_access_token(&user, &state.config)?;
    let refresh_token = issue_refresh_token(&user_id, &state.config)?;

    // Return the refreshed streak figures rather than the stale document.
    let mut user = user;
    user.current_streak = current_streak;
    user.longest_streak = longest_streak;

    Ok((user, token, refresh_token))
}

// 3. Set login PIN (authenticated)
pub async fn set_pin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetPinRequest>,
) -> Result<Json<SetPinResponse>> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    if !req.pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::invalid_data("PIN must contain only digits"));
    }

    let user_id = ObjectId::parse_str(&claims.sub)?;
    let pin_hash = hash(&req.pin, DEFAULT_COST)?;

    let users: Collection<User> = state.db.collection("users");
    let result = users
        .update_one(
            doc! { "_id": user_id },
            doc! { "$set": {
                "pin_hash": pin_hash,
                "updated_at": BsonDateTime::now(),
            }},
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::UserNotFound);
    }

    Ok(Json(SetPinResponse {
        success: true,
        message: "PIN set successfully".to_string(),
    }))
}

// 4. PIN login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<PinLoginRequest>,
) -> Result<Json<AuthResponse>> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let users: Collection<User> = state.db.collection("users");
    let user = users
        .find_one(doc! { "phone_number": &req.phone_number })
        .await?
        .ok_or(AppError::AuthError)?;

    if !user.is_active {
        return Err(AppError::Unauthorized);
    }

    let pin_hash = user.pin_hash.as_deref().ok_or(AppError::AuthError)?;
    if !verify(&req.pin, pin_hash)? {
        return Err(AppError::AuthError);
    }

    let user_id = user._id.ok_or(AppError::UserNotFound)?;
    let (current_streak, longest_streak) =
        state.gamification.record_login(&user, Utc::now()).await?;

    let token = issue_access_token(&user, &state.config)?;
    let refresh_token = issue_refresh_token(&user_id, &state.config)?;

    let mut user = user;
    user.current_streak = current_streak;
    user.longest_streak = longest_streak;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        token,
        refresh_token,
    }))
}

// 5. Refresh access token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>> {
    let decoding_key = DecodingKey::from_secret(state.config.jwt_refresh_secret.as_ref());
    let token_data = decode::<RefreshClaims>(
        &req.refresh_token,
        &decoding_key,
        &Validation::new(Algorithm::HS256),
    )?;

    let user_id = ObjectId::parse_str(&token_data.claims.sub)?;
    let users: Collection<User> = state.db.collection("users");
    let user = users
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or(AppError::UserNotFound)?;

    if !user.is_active {
        return Err(AppError::Unauthorized);
    }

    let token = issue_access_token(&user, &state.config)?;
    Ok(Json(RefreshTokenResponse { token }))
}

fn issue_access_token(user: &User, config: &AppConfig) -> Result<String> {
    let user_id = user._id.ok_or(AppError::UserNotFound)?;
    let exp = (Utc::now() + Duration::hours(config.jwt_expires_hours)).timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_hex(),
        phone_number: user.phone_number.clone(),
        role: user.role,
        exp,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )?)
}

fn issue_refresh_token(user_id: &ObjectId, config: &AppConfig) -> Result<String> {
    let exp =
        (Utc::now() + Duration::hours(config.jwt_refresh_expires_hours)).timestamp() as usize;

    let claims = RefreshClaims {
        sub: user_id.to_hex(),
        exp,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_refresh_secret.as_ref()),
    )?)
}
