//! Twilio SMS provider.
//!
//! Sends through a Messaging Service via the Messages API. Delivery
//! receipts land on the configured status-callback webhook with the
//! correlation ids appended as query parameters.

use async_trait::async_trait;

use bucketsend_core::config::SmsConfig;
use bucketsend_core::error::{BucketSendError, Result};
use bucketsend_core::traits::SmsSender;
use bucketsend_core::types::{OutboundSms, SmsCorrelation};

/// Twilio Messages API sender.
pub struct TwilioSender {
    config: SmsConfig,
    client: reqwest::Client,
}

impl TwilioSender {
    pub fn new(config: SmsConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }

    /// Build the per-message status-callback URL. None when no webhook
    /// base is configured.
    fn status_callback(&self, correlation: Option<&SmsCorrelation>) -> Result<Option<String>> {
        let base = self.config.status_callback_url.trim();
        if base.is_empty() {
            return Ok(None);
        }
        let Some(corr) = correlation else {
            return Ok(Some(base.to_string()));
        };
        let url = reqwest::Url::parse_with_params(
            base,
            &[
                ("user_id", corr.user_id.as_str()),
                ("client_id", corr.client_id.as_str()),
                ("bucket_id", corr.bucket_id.as_str()),
                ("message", corr.message.as_str()),
            ],
        )
        .map_err(|e| BucketSendError::Config(format!("Bad status callback URL: {e}")))?;
        Ok(Some(url.to_string()))
    }
}

#[async_trait]
impl SmsSender for TwilioSender {
    async fn send(&self, sms: &OutboundSms) -> Result<String> {
        if self.config.account_sid.is_empty() || self.config.auth_token.is_empty() {
            return Err(BucketSendError::Config(
                "Twilio account_sid/auth_token not configured".into(),
            ));
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );

        let mut form: Vec<(&str, &str)> = vec![
            ("To", sms.to.as_str()),
            ("Body", sms.body.as_str()),
            ("MessagingServiceSid", self.config.messaging_service_sid.as_str()),
        ];
        let callback = self.status_callback(sms.correlation.as_ref())?;
        if let Some(cb) = &callback {
            form.push(("StatusCallback", cb.as_str()));
        }

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| BucketSendError::Channel(format!("Twilio request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BucketSendError::Channel(format!(
                "Twilio API error {status}: {error_text}"
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BucketSendError::Channel(format!("Invalid Twilio response: {e}")))?;

        let sid = result["sid"].as_str().unwrap_or("unknown").to_string();
        tracing::debug!("Twilio message queued: {} → {}", sid, sms.to);
        Ok(sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(callback: &str) -> TwilioSender {
        TwilioSender::new(SmsConfig {
            account_sid: "AC123".into(),
            auth_token: "tok".into(),
            messaging_service_sid: "MG123".into(),
            status_callback_url: callback.into(),
        })
    }

    fn correlation() -> SmsCorrelation {
        SmsCorrelation {
            user_id: "u1".into(),
            client_id: "c1".into(),
            bucket_id: "b1".into(),
            message: "Book your next cut".into(),
        }
    }

    #[test]
    fn test_callback_carries_correlation_params() {
        let s = sender("https://hooks.example.com/sms-status");
        let url = s.status_callback(Some(&correlation())).unwrap().unwrap();
        assert!(url.starts_with("https://hooks.example.com/sms-status?"));
        assert!(url.contains("user_id=u1"));
        assert!(url.contains("client_id=c1"));
        assert!(url.contains("bucket_id=b1"));
        // Message body is query-encoded.
        assert!(url.contains("message=Book"));
        assert!(!url.contains("Book your"));
    }

    #[test]
    fn test_callback_disabled_without_base_url() {
        let s = sender("");
        assert!(s.status_callback(Some(&correlation())).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_credentials_rejected() {
        let s = TwilioSender::new(SmsConfig::default());
        let sms = OutboundSms { to: "+15550001".into(), body: "hi".into(), correlation: None };
        let err = s.send(&sms).await.unwrap_err();
        assert!(matches!(err, BucketSendError::Config(_)));
    }
}
