//! Collaborator traits.
//!
//! Every external system the pipeline touches sits behind one of these
//! seams: the bucket/ledger/profile/aggregate stores, the marketing-copy
//! generator, and the SMS provider. Production wires SQLite + HTTP
//! implementations; engine tests wire in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{NudgeWeekSeed, OutboundSms, OwnerProfile, SendRecord, SendReceipt, SmartBucket};

/// Weekly smart-bucket store.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// All buckets with status `active` for the given ISO week.
    async fn active_buckets(&self, iso_week: &str) -> Result<Vec<SmartBucket>>;

    /// Current `messages_failed` list for one bucket.
    async fn failed_numbers(&self, bucket_id: &str) -> Result<Vec<String>>;

    /// Overwrite the `messages_failed` list for one bucket.
    async fn set_failed_numbers(&self, bucket_id: &str, numbers: &[String]) -> Result<()>;
}

/// Send-record ledger: dedup source and audit trail.
#[async_trait]
pub trait SendRecordStore: Send + Sync {
    /// Successful sends previously recorded against one bucket.
    async fn successful_sends(&self, bucket_id: &str) -> Result<Vec<SendReceipt>>;

    /// Append one send attempt (success or failure).
    async fn insert(&self, record: &SendRecord) -> Result<()>;
}

/// Owner profile lookup.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Profile for one owner, None if the row is missing.
    async fn profile(&self, user_id: &str) -> Result<Option<OwnerProfile>>;
}

/// Nudge-success aggregate store.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Insert one zero-seeded (owner, week) aggregate row.
    async fn insert_week_seed(&self, seed: &NudgeWeekSeed) -> Result<()>;
}

/// Marketing-copy generation service.
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    /// One shared message body for a whole bucket, built from the
    /// owner's profile and booking link.
    async fn generate(&self, profile: &OwnerProfile, booking_link: &str) -> Result<String>;
}

/// Outbound SMS provider.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Send one message; returns the provider's delivery SID.
    async fn send(&self, sms: &OutboundSms) -> Result<String>;
}
