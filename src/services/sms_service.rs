use reqwest::Client;

use crate::errors::{AppError, Result};

#[derive(Clone)]
pub struct SmsService {
    api_key: String,
    username: String,
    from: String,
    client: Client,
}

impl SmsService {
    pub fn new(api_key: String, username: String, from: String) -> Self {
        Self {
            api_key,
            username,
            from,
            client: Client::new(),
        }
    }

    pub async fn send_otp(&self, phone: &str, otp: &str, expiry_minutes: u64) -> Result<()> {
        // Without provider credentials the code is only logged, which is
        // what local development and test environments want.
        if self.api_key.is_empty() {
            tracing::info!("[DEV MODE] SMS OTP to {}: {}", phone, otp);
            return Ok(());
        }

        let message = format!(
            "Your MutualNest OTP is: {}. Valid for {} minutes.",
            otp, expiry_minutes
        );

        let url = "https://api.africastalking.com/version1/messaging";

        let response = self
            .client
            .post(url)
            .header("apiKey", &self.api_key)
            .header("Accept", "application/json")
            .form(&[
                ("username", self.username.as_str()),
                ("to", phone),
                ("message", message.as_str()),
                ("from", self.from.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("SMS API error: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::ExternalApi(format!(
                "SMS sending failed with status: {}",
                response.status()
            )))
        }
    }
}
