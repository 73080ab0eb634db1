//! # BucketSend Store
//!
//! Implementations of the collaborator store traits: a SQLite store
//! for standalone deployments and an in-memory store for dev mode and
//! deterministic engine tests.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
