use std::sync::Arc;

use mongodb::Database;

use crate::config::AppConfig;
use crate::services::gamification::GamificationService;
use crate::services::otp_store::OtpStore;
use crate::services::sms_service::SmsService;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub otp_store: Arc<OtpStore>,
    pub sms_service: SmsService,
    pub gamification: GamificationService,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let otp_store = Arc::new(OtpStore::new(config.otp_config()));
        let sms_service = SmsService::new(
            config.sms_api_key.clone(),
            config.sms_username.clone(),
            config.sms_from.clone(),
        );
        let gamification = GamificationService::new(
            db.clone(),
            config.tier_thresholds(),
            config.referral_reward_points,
        );

        AppState {
            db,
            config,
            otp_store,
            sms_service,
            gamification,
        }
    }
}
