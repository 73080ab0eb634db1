//! Marketing-copy generation clients.
//!
//! `CopyGenClient` talks to the external generation service; it is an
//! opaque text source as far as the pipeline is concerned. The service
//! answers with either a generated `message` or a static `template`.
//! `TemplateGenerator` is the local substitute for dev mode and seeded
//! demos.

use async_trait::async_trait;

use bucketsend_core::config::CopyGenConfig;
use bucketsend_core::error::{BucketSendError, Result};
use bucketsend_core::traits::MessageGenerator;
use bucketsend_core::types::OwnerProfile;

/// HTTP client for the copy-generation service.
pub struct CopyGenClient {
    config: CopyGenConfig,
    client: reqwest::Client,
}

impl CopyGenClient {
    pub fn new(config: CopyGenConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }
}

/// Pull the text out of a generation response: `message` preferred,
/// `template` accepted.
fn extract_copy(value: &serde_json::Value) -> Option<&str> {
    value["message"].as_str().or_else(|| value["template"].as_str())
}

#[async_trait]
impl MessageGenerator for CopyGenClient {
    async fn generate(&self, profile: &OwnerProfile, booking_link: &str) -> Result<String> {
        if self.config.endpoint.is_empty() {
            return Err(BucketSendError::CopyGen("Generation endpoint not configured".into()));
        }

        let body = serde_json::json!({
            "prompt": self.config.prompt,
            "profile": {
                "full_name": profile.full_name,
                "email": profile.email,
                "phone": profile.phone,
                "username": profile.username,
                "booking_link": booking_link,
            },
        });

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.config.api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| BucketSendError::CopyGen(format!("Generation request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BucketSendError::CopyGen(format!(
                "Generation service error {status}: {error_text}"
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BucketSendError::CopyGen(format!("Invalid generation response: {e}")))?;

        extract_copy(&result)
            .map(String::from)
            .ok_or_else(|| BucketSendError::CopyGen("Response had no message or template".into()))
    }
}

/// Local deterministic generator: `{name}` and `{link}` substitution.
pub struct TemplateGenerator {
    template: String,
}

impl TemplateGenerator {
    pub fn new(template: &str) -> Self {
        Self { template: template.into() }
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new("Hey, it's {name}! Time for a fresh cut — grab a spot here: {link}")
    }
}

#[async_trait]
impl MessageGenerator for TemplateGenerator {
    async fn generate(&self, profile: &OwnerProfile, booking_link: &str) -> Result<String> {
        Ok(self
            .template
            .replace("{name}", &profile.full_name)
            .replace("{link}", booking_link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_copy_prefers_message() {
        let v = serde_json::json!({"message": "hi", "template": "bye"});
        assert_eq!(extract_copy(&v), Some("hi"));
        let v = serde_json::json!({"template": "bye"});
        assert_eq!(extract_copy(&v), Some("bye"));
        let v = serde_json::json!({"status": "ok"});
        assert_eq!(extract_copy(&v), None);
    }

    #[tokio::test]
    async fn test_template_generator_substitution() {
        let g = TemplateGenerator::default();
        let profile = OwnerProfile {
            full_name: "Dre".into(),
            email: String::new(),
            phone: String::new(),
            username: "fadezone".into(),
        };
        let msg = g.generate(&profile, "https://book.example.com/fadezone").await.unwrap();
        assert!(msg.contains("Dre"));
        assert!(msg.contains("https://book.example.com/fadezone"));
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_rejected() {
        let c = CopyGenClient::new(CopyGenConfig::default());
        let profile = OwnerProfile {
            full_name: "Dre".into(),
            email: String::new(),
            phone: String::new(),
            username: "fadezone".into(),
        };
        let err = c.generate(&profile, "https://x").await.unwrap_err();
        assert!(matches!(err, BucketSendError::CopyGen(_)));
    }
}
