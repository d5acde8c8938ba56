//! Outbound SMS delivery.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    config::TwilioConfig,
    error::{AppError, AppResult},
};

const SMS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const SMS_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, phone: &str, message: &str) -> AppResult<()>;
}

/// Sends messages through the Twilio Messages API.
pub struct TwilioSms {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioSms {
    pub fn new(config: TwilioConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(SMS_CONNECT_TIMEOUT)
            .timeout(SMS_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSms {
    async fn send_sms(&self, phone: &str, message: &str) -> AppResult<()> {
        let params = [
            ("To", phone),
            ("From", self.config.from_number.as_str()),
            ("Body", message),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("sms request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "sms provider returned {}",
                response.status()
            )));
        }

        tracing::info!(to = %phone, "sms dispatched");
        Ok(())
    }
}

/// Used when no SMS provider is configured; the message only reaches the log.
pub struct LogSms;

#[async_trait]
impl SmsSender for LogSms {
    async fn send_sms(&self, phone: &str, message: &str) -> AppResult<()> {
        tracing::info!(to = %phone, message = %message, "sms provider not configured, logging message");
        Ok(())
    }
}
