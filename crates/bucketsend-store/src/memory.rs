//! In-memory store: every trait backed by mutex-guarded maps.
//!
//! Used for the no-database dev mode and by engine tests. Not durable.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use bucketsend_core::error::{BucketSendError, Result};
use bucketsend_core::traits::{AggregateStore, BucketStore, ProfileStore, SendRecordStore};
use bucketsend_core::types::{NudgeWeekSeed, OwnerProfile, SendRecord, SendReceipt, SmartBucket};

#[derive(Default)]
struct Inner {
    buckets: Vec<SmartBucket>,
    records: Vec<SendRecord>,
    profiles: HashMap<String, OwnerProfile>,
    seeds: Vec<NudgeWeekSeed>,
}

/// All four store traits over one shared in-memory state.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bucket(&self, bucket: SmartBucket) {
        self.inner.lock().unwrap().buckets.push(bucket);
    }

    pub fn add_profile(&self, user_id: &str, profile: OwnerProfile) {
        self.inner.lock().unwrap().profiles.insert(user_id.into(), profile);
    }

    /// Preseed the ledger (e.g. to simulate a prior week's sends).
    pub fn add_record(&self, record: SendRecord) {
        self.inner.lock().unwrap().records.push(record);
    }

    pub fn bucket(&self, bucket_id: &str) -> Option<SmartBucket> {
        self.inner.lock().unwrap().buckets.iter().find(|b| b.id == bucket_id).cloned()
    }

    pub fn records(&self) -> Vec<SendRecord> {
        self.inner.lock().unwrap().records.clone()
    }

    pub fn seeds(&self) -> Vec<NudgeWeekSeed> {
        self.inner.lock().unwrap().seeds.clone()
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn active_buckets(&self, iso_week: &str) -> Result<Vec<SmartBucket>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .buckets
            .iter()
            .filter(|b| b.is_active() && b.iso_week == iso_week)
            .cloned()
            .collect())
    }

    async fn failed_numbers(&self, bucket_id: &str) -> Result<Vec<String>> {
        self.inner
            .lock()
            .unwrap()
            .buckets
            .iter()
            .find(|b| b.id == bucket_id)
            .map(|b| b.messages_failed.clone())
            .ok_or_else(|| BucketSendError::Store(format!("No bucket {bucket_id}")))
    }

    async fn set_failed_numbers(&self, bucket_id: &str, numbers: &[String]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let bucket = inner
            .buckets
            .iter_mut()
            .find(|b| b.id == bucket_id)
            .ok_or_else(|| BucketSendError::Store(format!("No bucket {bucket_id}")))?;
        bucket.messages_failed = numbers.to_vec();
        Ok(())
    }
}

#[async_trait]
impl SendRecordStore for MemoryStore {
    async fn successful_sends(&self, bucket_id: &str) -> Result<Vec<SendReceipt>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.smart_bucket_id == bucket_id && r.is_sent)
            .map(|r| SendReceipt { client_id: r.client_id.clone(), created_at: r.created_at })
            .collect())
    }

    async fn insert(&self, record: &SendRecord) -> Result<()> {
        self.inner.lock().unwrap().records.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn profile(&self, user_id: &str) -> Result<Option<OwnerProfile>> {
        Ok(self.inner.lock().unwrap().profiles.get(user_id).cloned())
    }
}

#[async_trait]
impl AggregateStore for MemoryStore {
    async fn insert_week_seed(&self, seed: &NudgeWeekSeed) -> Result<()> {
        self.inner.lock().unwrap().seeds.push(seed.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketsend_core::types::BUCKET_STATUS_ACTIVE;

    fn bucket(id: &str, week: &str, status: &str) -> SmartBucket {
        SmartBucket {
            id: id.into(),
            user_id: "u1".into(),
            iso_week: week.into(),
            status: status.into(),
            clients: vec![],
            messages_failed: vec![],
        }
    }

    #[tokio::test]
    async fn test_active_bucket_filter() {
        let store = MemoryStore::new();
        store.add_bucket(bucket("b1", "2026-W35", BUCKET_STATUS_ACTIVE));
        store.add_bucket(bucket("b2", "2026-W35", "archived"));
        store.add_bucket(bucket("b3", "2026-W34", BUCKET_STATUS_ACTIVE));

        let active = store.active_buckets("2026-W35").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "b1");
    }

    #[tokio::test]
    async fn test_failed_number_roundtrip() {
        let store = MemoryStore::new();
        store.add_bucket(bucket("b1", "2026-W35", BUCKET_STATUS_ACTIVE));
        assert!(store.failed_numbers("b1").await.unwrap().is_empty());

        store.set_failed_numbers("b1", &["+15550002".into()]).await.unwrap();
        assert_eq!(store.failed_numbers("b1").await.unwrap(), vec!["+15550002".to_string()]);

        assert!(store.failed_numbers("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_successful_sends_excludes_failures() {
        let store = MemoryStore::new();
        let ok = SendRecord::new("u1", "b1", Some("c1"), "+1", true, "weekly_nudge", "hi", None);
        let bad = SendRecord::new(
            "u1", "b1", Some("c2"), "+2", false, "weekly_nudge", "hi",
            Some("rejected".into()),
        );
        store.insert(&ok).await.unwrap();
        store.insert(&bad).await.unwrap();

        let receipts = store.successful_sends("b1").await.unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].client_id.as_deref(), Some("c1"));
    }
}
