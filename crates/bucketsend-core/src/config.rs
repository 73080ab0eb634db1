//! BucketSend configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BucketSendError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketSendConfig {
    /// IANA timezone all scheduling math runs in. Every owner and client
    /// is evaluated against this one clock, not per-owner timezones.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Dedup cooldown in absolute days (wall-clock, not calendar).
    #[serde(default = "default_cooldown_days")]
    pub cooldown_days: i64,
    /// Base URL the per-owner booking link is built from.
    #[serde(default = "default_booking_base")]
    pub booking_base_url: String,
    /// Footer appended to every outbound SMS body.
    #[serde(default = "default_unsubscribe_footer")]
    pub unsubscribe_footer: String,
    /// Purpose tag written on every send record.
    #[serde(default = "default_purpose")]
    pub purpose: String,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub copygen: CopyGenConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_timezone() -> String { "America/Toronto".into() }
fn default_cooldown_days() -> i64 { 10 }
fn default_booking_base() -> String { "https://book.bucketsend.io".into() }
fn default_unsubscribe_footer() -> String { "Reply STOP to unsubscribe.".into() }
fn default_purpose() -> String { "weekly_nudge".into() }

impl Default for BucketSendConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            cooldown_days: default_cooldown_days(),
            booking_base_url: default_booking_base(),
            unsubscribe_footer: default_unsubscribe_footer(),
            purpose: default_purpose(),
            gateway: GatewayConfig::default(),
            sms: SmsConfig::default(),
            copygen: CopyGenConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl BucketSendConfig {
    /// Load config from the default path (~/.bucketsend/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BucketSendError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| BucketSendError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| BucketSendError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the BucketSend home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bucketsend")
    }

    /// Booking link for one owner: `{base}/{username}`.
    pub fn booking_link(&self, username: &str) -> String {
        format!("{}/{}", self.booking_base_url.trim_end_matches('/'), username)
    }
}

/// HTTP trigger gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8790 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// SMS provider (Twilio Messages API) configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    /// Messaging Service the sends are routed through.
    #[serde(default)]
    pub messaging_service_sid: String,
    /// Delivery-status webhook base; correlation ids are appended as
    /// query parameters per message.
    #[serde(default)]
    pub status_callback_url: String,
}

/// Marketing-copy generation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyGenConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    /// Prompt sent alongside the owner profile.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_prompt() -> String {
    "Write a short, friendly SMS inviting the client to book their next appointment.".into()
}

impl Default for CopyGenConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            prompt: default_prompt(),
        }
    }
}

/// Local store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. Empty means `~/.bucketsend/bucketsend.db`.
    #[serde(default)]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: String::new() }
    }
}

impl StoreConfig {
    /// Resolve the database path, falling back to the default location.
    pub fn db_path(&self) -> PathBuf {
        if self.path.is_empty() {
            BucketSendConfig::home_dir().join("bucketsend.db")
        } else {
            PathBuf::from(&self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = BucketSendConfig::default();
        assert_eq!(cfg.timezone, "America/Toronto");
        assert_eq!(cfg.cooldown_days, 10);
        assert_eq!(cfg.gateway.port, 8790);
    }

    #[test]
    fn test_booking_link_trims_trailing_slash() {
        let cfg = BucketSendConfig {
            booking_base_url: "https://book.example.com/".into(),
            ..Default::default()
        };
        assert_eq!(cfg.booking_link("fadezone"), "https://book.example.com/fadezone");
    }

    #[test]
    fn test_partial_toml_roundtrip() {
        let cfg: BucketSendConfig =
            toml::from_str("cooldown_days = 14\n[gateway]\nport = 9000\n").unwrap();
        assert_eq!(cfg.cooldown_days, 14);
        assert_eq!(cfg.gateway.port, 9000);
        assert_eq!(cfg.timezone, "America/Toronto");
    }
}
