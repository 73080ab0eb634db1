//! SQLite store — single-file persistence for standalone deployments.
//!
//! The embedded client list and failure list are JSON text columns, the
//! same denormalized shape the buckets arrive in from upstream.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use bucketsend_core::error::{BucketSendError, Result};
use bucketsend_core::traits::{AggregateStore, BucketStore, ProfileStore, SendRecordStore};
use bucketsend_core::types::{NudgeWeekSeed, OwnerProfile, SendRecord, SendReceipt, SmartBucket};

/// All four store traits over one SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn store_err(e: impl std::fmt::Display) -> BucketSendError {
    BucketSendError::Store(e.to_string())
}

/// Shared SELECT column list for bucket queries.
const BUCKET_SELECT: &str =
    "SELECT id, user_id, iso_week, status, clients_json, messages_failed_json FROM smart_buckets";

fn row_to_bucket(row: &rusqlite::Row) -> rusqlite::Result<(SmartBucket, String, String)> {
    let bucket = SmartBucket {
        id: row.get(0)?,
        user_id: row.get(1)?,
        iso_week: row.get(2)?,
        status: row.get(3)?,
        clients: Vec::new(),
        messages_failed: Vec::new(),
    };
    Ok((bucket, row.get(4)?, row.get(5)?))
}

fn hydrate_bucket((mut bucket, clients_json, failed_json): (SmartBucket, String, String)) -> Result<SmartBucket> {
    bucket.clients = serde_json::from_str(&clients_json)
        .map_err(|e| store_err(format!("Bad clients JSON for bucket {}: {e}", bucket.id)))?;
    bucket.messages_failed = serde_json::from_str(&failed_json)
        .map_err(|e| store_err(format!("Bad failure-list JSON for bucket {}: {e}", bucket.id)))?;
    Ok(bucket)
}

fn parse_created_at(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| store_err(format!("Bad timestamp '{raw}': {e}")))
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(store_err)?;

        // WAL so the job and a concurrent reader don't trip over locks.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(store_err)?;

        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    /// Fresh in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS smart_buckets (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                iso_week TEXT NOT NULL,
                status TEXT DEFAULT 'active',
                clients_json TEXT DEFAULT '[]',
                messages_failed_json TEXT DEFAULT '[]',
                created_at TEXT DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS send_records (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                smart_bucket_id TEXT NOT NULL,
                client_id TEXT,
                phone_normalized TEXT NOT NULL,
                is_sent INTEGER NOT NULL,
                purpose TEXT DEFAULT '',
                message TEXT DEFAULT '',
                reason TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_send_records_bucket
                ON send_records(smart_bucket_id, is_sent);

            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                full_name TEXT DEFAULT '',
                email TEXT DEFAULT '',
                phone TEXT DEFAULT '',
                username TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS nudge_weeks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                iso_week_number TEXT NOT NULL,
                messages_delivered INTEGER DEFAULT 0,
                clicked_link INTEGER DEFAULT 0,
                client_ids_json TEXT DEFAULT '[]',
                services_json TEXT DEFAULT '[]',
                appointment_dates_json TEXT DEFAULT '[]',
                created_at TEXT DEFAULT (datetime('now'))
            );
            ",
            )
            .map_err(store_err)
    }

    /// Upsert one bucket (seeding and upstream sync).
    pub fn put_bucket(&self, bucket: &SmartBucket) -> Result<()> {
        let clients = serde_json::to_string(&bucket.clients).map_err(store_err)?;
        let failed = serde_json::to_string(&bucket.messages_failed).map_err(store_err)?;
        self.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO smart_buckets (id, user_id, iso_week, status, clients_json, messages_failed_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                   user_id = excluded.user_id,
                   iso_week = excluded.iso_week,
                   status = excluded.status,
                   clients_json = excluded.clients_json,
                   messages_failed_json = excluded.messages_failed_json",
                params![bucket.id, bucket.user_id, bucket.iso_week, bucket.status, clients, failed],
            )
            .map_err(store_err)?;
        Ok(())
    }

    /// Upsert one owner profile (seeding and upstream sync).
    pub fn put_profile(&self, user_id: &str, profile: &OwnerProfile) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO profiles (user_id, full_name, email, phone, username)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                   full_name = excluded.full_name,
                   email = excluded.email,
                   phone = excluded.phone,
                   username = excluded.username",
                params![user_id, profile.full_name, profile.email, profile.phone, profile.username],
            )
            .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl BucketStore for SqliteStore {
    async fn active_buckets(&self, iso_week: &str) -> Result<Vec<SmartBucket>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!("{BUCKET_SELECT} WHERE status = 'active' AND iso_week = ?1"))
            .map_err(store_err)?;
        let rows = stmt
            .query_map(params![iso_week], row_to_bucket)
            .map_err(store_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(store_err)?;
        rows.into_iter().map(hydrate_bucket).collect()
    }

    async fn failed_numbers(&self, bucket_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let raw: String = conn
            .query_row(
                "SELECT messages_failed_json FROM smart_buckets WHERE id = ?1",
                params![bucket_id],
                |row| row.get(0),
            )
            .map_err(store_err)?;
        serde_json::from_str(&raw)
            .map_err(|e| store_err(format!("Bad failure-list JSON for bucket {bucket_id}: {e}")))
    }

    async fn set_failed_numbers(&self, bucket_id: &str, numbers: &[String]) -> Result<()> {
        let raw = serde_json::to_string(numbers).map_err(store_err)?;
        let updated = self
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE smart_buckets SET messages_failed_json = ?1 WHERE id = ?2",
                params![raw, bucket_id],
            )
            .map_err(store_err)?;
        if updated == 0 {
            return Err(store_err(format!("No bucket {bucket_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SendRecordStore for SqliteStore {
    async fn successful_sends(&self, bucket_id: &str) -> Result<Vec<SendReceipt>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT client_id, created_at FROM send_records
                 WHERE smart_bucket_id = ?1 AND is_sent = 1",
            )
            .map_err(store_err)?;
        let rows = stmt
            .query_map(params![bucket_id], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(store_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(store_err)?;
        rows.into_iter()
            .map(|(client_id, raw)| {
                Ok(SendReceipt { client_id, created_at: parse_created_at(&raw)? })
            })
            .collect()
    }

    async fn insert(&self, record: &SendRecord) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO send_records
                   (id, user_id, smart_bucket_id, client_id, phone_normalized,
                    is_sent, purpose, message, reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.user_id,
                    record.smart_bucket_id,
                    record.client_id,
                    record.phone_normalized,
                    record.is_sent as i64,
                    record.purpose,
                    record.message,
                    record.reason,
                    record.created_at.to_rfc3339(),
                ],
            )
            .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn profile(&self, user_id: &str) -> Result<Option<OwnerProfile>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT full_name, email, phone, username FROM profiles WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(OwnerProfile {
                    full_name: row.get(0)?,
                    email: row.get(1)?,
                    phone: row.get(2)?,
                    username: row.get(3)?,
                })
            },
        );
        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(store_err(e)),
        }
    }
}

#[async_trait]
impl AggregateStore for SqliteStore {
    async fn insert_week_seed(&self, seed: &NudgeWeekSeed) -> Result<()> {
        let client_ids = serde_json::to_string(&seed.client_ids).map_err(store_err)?;
        let services = serde_json::to_string(&seed.services).map_err(store_err)?;
        let dates = serde_json::to_string(&seed.appointment_dates).map_err(store_err)?;
        self.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO nudge_weeks
                   (user_id, iso_week_number, messages_delivered, clicked_link,
                    client_ids_json, services_json, appointment_dates_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    seed.user_id,
                    seed.iso_week_number,
                    seed.messages_delivered,
                    seed.clicked_link,
                    client_ids,
                    services,
                    dates,
                ],
            )
            .map_err(store_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketsend_core::types::{SendCandidate, BUCKET_STATUS_ACTIVE};

    fn sample_bucket(id: &str, week: &str, status: &str) -> SmartBucket {
        SmartBucket {
            id: id.into(),
            user_id: "u1".into(),
            iso_week: week.into(),
            status: status.into(),
            clients: vec![SendCandidate {
                client_id: "c1".into(),
                name: "Jo".into(),
                phone: "+15550001".into(),
                bucket_tag: "Friday|Morning".into(),
                nudge_token: Some("tok".into()),
            }],
            messages_failed: vec![],
        }
    }

    #[tokio::test]
    async fn test_bucket_roundtrip_and_filter() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put_bucket(&sample_bucket("b1", "2026-W35", BUCKET_STATUS_ACTIVE)).unwrap();
        store.put_bucket(&sample_bucket("b2", "2026-W35", "archived")).unwrap();
        store.put_bucket(&sample_bucket("b3", "2026-W34", BUCKET_STATUS_ACTIVE)).unwrap();

        let active = store.active_buckets("2026-W35").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "b1");
        assert_eq!(active[0].clients.len(), 1);
        assert_eq!(active[0].clients[0].bucket_tag, "Friday|Morning");
    }

    #[tokio::test]
    async fn test_failed_numbers_update() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put_bucket(&sample_bucket("b1", "2026-W35", BUCKET_STATUS_ACTIVE)).unwrap();

        store
            .set_failed_numbers("b1", &["+15550002".into(), "+15550002".into()])
            .await
            .unwrap();
        // Duplicates preserved: append semantics, no dedup.
        assert_eq!(store.failed_numbers("b1").await.unwrap().len(), 2);

        assert!(store.set_failed_numbers("missing", &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_send_record_ledger() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ok = SendRecord::new("u1", "b1", Some("c1"), "+1", true, "weekly_nudge", "hi", None);
        let bad = SendRecord::new(
            "u1", "b1", Some("c2"), "+2", false, "weekly_nudge", "hi",
            Some("unreachable".into()),
        );
        store.insert(&ok).await.unwrap();
        store.insert(&bad).await.unwrap();

        let receipts = store.successful_sends("b1").await.unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].client_id.as_deref(), Some("c1"));
        // Timestamps survive the round trip to the second.
        assert_eq!(receipts[0].created_at.timestamp(), ok.created_at.timestamp());
    }

    #[tokio::test]
    async fn test_profile_lookup() {
        let store = SqliteStore::open_in_memory().unwrap();
        let profile = OwnerProfile {
            full_name: "Dre".into(),
            email: "dre@example.com".into(),
            phone: "+15550000".into(),
            username: "fadezone".into(),
        };
        store.put_profile("u1", &profile).unwrap();

        let found = store.profile("u1").await.unwrap().unwrap();
        assert_eq!(found.username, "fadezone");
        assert!(store.profile("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_week_seed_insert() {
        let store = SqliteStore::open_in_memory().unwrap();
        let seed = NudgeWeekSeed::zeroed("u1", "2026-W35");
        store.insert_week_seed(&seed).await.unwrap();
        // Re-running the job seeds another row; duplicates are fine here.
        store.insert_week_seed(&seed).await.unwrap();
    }
}
