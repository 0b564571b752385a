// config.rs
use std::env;
use std::time::Duration;

use crate::errors::{AppError, Result};
use crate::services::otp_store::OtpConfig;

/// Tier thresholds for the loyalty level classifier, in the platform
/// currency unit. Ordering `silver_min <= gold_min <= platinum_min` is
/// validated when the config is loaded.
#[derive(Debug, Clone, Copy)]
pub struct TierThresholds {
    pub silver_min: f64,
    pub gold_min: f64,
    pub platinum_min: f64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub jwt_expires_hours: i64,
    pub jwt_refresh_expires_hours: i64,
    pub otp_expiry_minutes: u64,
    pub otp_max_attempts: u32,
    pub level_silver_min: f64,
    pub level_gold_min: f64,
    pub level_platinum_min: f64,
    pub referral_reward_points: i32,
    pub sms_api_key: String,
    pub sms_username: String,
    pub sms_from: String,
    pub port: u16,
    pub host: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let config = AppConfig {
            database_url: env::var("DATABASE_URL").map_err(|_| {
                AppError::ConfigurationError("DATABASE_URL must be set".to_string())
            })?,
            jwt_secret: env::var("JWT_SECRET").map_err(|_| {
                AppError::ConfigurationError("JWT_SECRET must be set".to_string())
            })?,
            jwt_refresh_secret: env::var("JWT_REFRESH_SECRET")
                .or_else(|_| env::var("JWT_SECRET"))
                .map_err(|_| {
                    AppError::ConfigurationError("JWT_REFRESH_SECRET must be set".to_string())
                })?,
            jwt_expires_hours: parse_var("JWT_EXPIRES_HOURS", 168)?,
            jwt_refresh_expires_hours: parse_var("JWT_REFRESH_EXPIRES_HOURS", 720)?,
            otp_expiry_minutes: parse_var("OTP_EXPIRY_MINUTES", 5)?,
            otp_max_attempts: parse_var("OTP_MAX_ATTEMPTS", 3)?,
            level_silver_min: parse_var("LEVEL_SILVER_MIN", 1000.0)?,
            level_gold_min: parse_var("LEVEL_GOLD_MIN", 5000.0)?,
            level_platinum_min: parse_var("LEVEL_PLATINUM_MIN", 20000.0)?,
            referral_reward_points: parse_var("REFERRAL_REWARD_POINTS", 100)?,
            sms_api_key: env::var("SMS_API_KEY").unwrap_or_default(),
            sms_username: env::var("SMS_USERNAME").unwrap_or_else(|_| "sandbox".to_string()),
            sms_from: env::var("SMS_FROM").unwrap_or_else(|_| "MutualNest".to_string()),
            port: parse_var("PORT", 8000)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.otp_expiry_minutes == 0 {
            return Err(AppError::ConfigurationError(
                "OTP_EXPIRY_MINUTES must be greater than zero".to_string(),
            ));
        }
        if self.otp_max_attempts == 0 {
            return Err(AppError::ConfigurationError(
                "OTP_MAX_ATTEMPTS must be greater than zero".to_string(),
            ));
        }
        // An inverted ordering silently produces confusing tier assignments,
        // so refuse to start with one.
        if self.level_silver_min > self.level_gold_min
            || self.level_gold_min > self.level_platinum_min
        {
            return Err(AppError::ConfigurationError(format!(
                "level thresholds must be ordered: silver ({}) <= gold ({}) <= platinum ({})",
                self.level_silver_min, self.level_gold_min, self.level_platinum_min
            )));
        }
        Ok(())
    }

    pub fn otp_config(&self) -> OtpConfig {
        OtpConfig {
            ttl: Duration::from_secs(self.otp_expiry_minutes * 60),
            max_attempts: self.otp_max_attempts,
        }
    }

    pub fn tier_thresholds(&self) -> TierThresholds {
        TierThresholds {
            silver_min: self.level_silver_min,
            gold_min: self.level_gold_min,
            platinum_min: self.level_platinum_min,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| {
            AppError::ConfigurationError(format!("{} must be a valid number, got '{}'", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "mongodb://localhost:27017".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_refresh_secret: "test-refresh-secret".to_string(),
            jwt_expires_hours: 168,
            jwt_refresh_expires_hours: 720,
            otp_expiry_minutes: 5,
            otp_max_attempts: 3,
            level_silver_min: 1000.0,
            level_gold_min: 5000.0,
            level_platinum_min: 20000.0,
            referral_reward_points: 100,
            sms_api_key: String::new(),
            sms_username: "sandbox".to_string(),
            sms_from: "MutualNest".to_string(),
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }

    #[test]
    fn default_thresholds_pass_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut config = base_config();
        config.level_gold_min = 500.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn equal_thresholds_are_allowed() {
        let mut config = base_config();
        config.level_gold_min = 1000.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let mut config = base_config();
        config.otp_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn otp_config_converts_minutes_to_duration() {
        let otp = base_config().otp_config();
        assert_eq!(otp.ttl, Duration::from_secs(300));
        assert_eq!(otp.max_attempts, 3);
    }
}
