//! Domain types shared across the nudge pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status a bucket must hold to be processed.
pub const BUCKET_STATUS_ACTIVE: &str = "active";

/// One smart bucket: the weekly nudge candidate list for one owner.
///
/// Created upstream when a week's candidate list is computed. This
/// subsystem only ever appends to `messages_failed`; it never deletes a
/// bucket or edits its client list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartBucket {
    pub id: String,
    pub user_id: String,
    /// ISO-8601 week string, e.g. "2026-W35".
    pub iso_week: String,
    pub status: String,
    #[serde(default)]
    pub clients: Vec<SendCandidate>,
    /// Phone numbers that failed delivery this week. Append-only,
    /// duplicates across runs accepted.
    #[serde(default)]
    pub messages_failed: Vec<String>,
}

impl SmartBucket {
    pub fn is_active(&self) -> bool {
        self.status == BUCKET_STATUS_ACTIVE
    }
}

/// One client send-candidate embedded in a bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCandidate {
    pub client_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    /// Composite "Day|Time" preference, e.g. "Friday|Morning",
    /// "Any-day|Any-time". Empty means the client is not yet configured
    /// and is skipped without error.
    #[serde(default, alias = "appointment_datecreated_bucket")]
    pub bucket_tag: String,
    /// Single-use personalization token spliced into the booking link.
    #[serde(default)]
    pub nudge_token: Option<String>,
}

/// One send attempt, successful or not. Doubles as the dedup ledger and
/// the audit trail; insert-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRecord {
    pub id: String,
    pub user_id: String,
    pub smart_bucket_id: String,
    pub client_id: Option<String>,
    pub phone_normalized: String,
    pub is_sent: bool,
    pub purpose: String,
    /// The exact body handed to the provider.
    pub message: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SendRecord {
    /// Build a fresh record stamped now with a generated id.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: &str,
        bucket_id: &str,
        client_id: Option<&str>,
        phone: &str,
        is_sent: bool,
        purpose: &str,
        message: &str,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            smart_bucket_id: bucket_id.into(),
            client_id: client_id.map(String::from),
            phone_normalized: phone.into(),
            is_sent,
            purpose: purpose.into(),
            message: message.into(),
            reason,
            created_at: Utc::now(),
        }
    }
}

/// Per-client timestamp of the most recent successful send, reduced
/// from the bucket's send records at the start of bucket processing.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub client_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Owner profile, read-only here. `username` builds the booking link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerProfile {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub username: String,
}

/// Zero-seeded weekly nudge-success aggregate. Inserted once per
/// (owner, week) per run; a downstream click tracker increments it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NudgeWeekSeed {
    pub user_id: String,
    pub iso_week_number: String,
    pub messages_delivered: u32,
    pub clicked_link: u32,
    pub client_ids: Vec<String>,
    pub services: Vec<String>,
    pub appointment_dates: Vec<String>,
}

impl NudgeWeekSeed {
    pub fn zeroed(user_id: &str, iso_week: &str) -> Self {
        Self {
            user_id: user_id.into(),
            iso_week_number: iso_week.into(),
            messages_delivered: 0,
            clicked_link: 0,
            client_ids: Vec::new(),
            services: Vec::new(),
            appointment_dates: Vec::new(),
        }
    }
}

/// One outbound SMS handed to the provider.
#[derive(Debug, Clone)]
pub struct OutboundSms {
    pub to: String,
    pub body: String,
    /// Correlation ids the provider attaches to its delivery-status
    /// callback so the downstream webhook can attribute the receipt.
    pub correlation: Option<SmsCorrelation>,
}

/// Query parameters carried on the delivery-status callback URL.
#[derive(Debug, Clone)]
pub struct SmsCorrelation {
    pub user_id: String,
    pub client_id: String,
    pub bucket_id: String,
    /// The exact body sent, echoed back for the click/delivery tracker.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_active_flag() {
        let mut bucket = SmartBucket {
            id: "b1".into(),
            user_id: "u1".into(),
            iso_week: "2026-W35".into(),
            status: BUCKET_STATUS_ACTIVE.into(),
            clients: vec![],
            messages_failed: vec![],
        };
        assert!(bucket.is_active());
        bucket.status = "archived".into();
        assert!(!bucket.is_active());
    }

    #[test]
    fn test_candidate_accepts_legacy_tag_column() {
        let json = r#"{"client_id":"c1","appointment_datecreated_bucket":"Friday|Night"}"#;
        let c: SendCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(c.bucket_tag, "Friday|Night");
        assert!(c.nudge_token.is_none());
    }

    #[test]
    fn test_zeroed_seed() {
        let seed = NudgeWeekSeed::zeroed("u1", "2026-W35");
        assert_eq!(seed.messages_delivered, 0);
        assert_eq!(seed.clicked_link, 0);
        assert!(seed.client_ids.is_empty());
    }
}
