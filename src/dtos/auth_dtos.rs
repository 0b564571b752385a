use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::UserResponse;

/// What the one-time code is for. Doubles as the `purpose` half of the
/// OTP store key, so a login code can never be replayed for signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Login,
    Signup,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Login => "login",
            OtpPurpose::Signup => "signup",
        }
    }
}

// Request DTOs
#[derive(Debug, Deserialize, Validate)]
pub struct RequestOtpRequest {
    #[validate(length(min = 10, max = 20, message = "Phone number must be 10-20 characters"))]
    pub phone_number: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 10, max = 20, message = "Phone number must be 10-20 characters"))]
    pub phone_number: String,
    pub purpose: OtpPurpose,
    #[validate(length(min = 6, max = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
    // Signup-only fields
    pub full_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub referral_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetPinRequest {
    #[validate(length(min = 4, max = 6, message = "PIN must be 4-6 digits"))]
    pub pin: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PinLoginRequest {
    #[validate(length(min = 10, max = 20, message = "Phone number must be 10-20 characters"))]
    pub phone_number: String,
    #[validate(length(min = 4, max = 6, message = "PIN must be 4-6 digits"))]
    pub pin: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

// Response DTOs
#[derive(Debug, Serialize)]
pub struct RequestOtpResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_left: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

impl VerifyOtpResponse {
    pub fn failure(message: impl Into<String>, attempts_left: Option<u32>) -> Self {
        VerifyOtpResponse {
            success: false,
            message: message.into(),
            attempts_left,
            token: None,
            refresh_token: None,
            user: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct SetPinResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub token: String,
}
