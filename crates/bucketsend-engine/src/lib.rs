//! # BucketSend Engine
//!
//! The run pipeline: window classification → bucket load → per-bucket
//! eligibility filtering → message generation → per-client dispatch and
//! bookkeeping.
//!
//! ## Control flow
//! ```text
//! run_pipeline(now)
//!   ├── classify(now in scheduling tz) → RunWindow / effective batch
//!   ├── BucketStore::active_buckets(iso week)          ── fatal on error
//!   └── per bucket (sequential):
//!         ├── SendRecordStore::successful_sends        ── bucket-scoped
//!         ├── EligibilityGate (cooldown, day, window)
//!         ├── ProfileStore::profile                    ── bucket-scoped
//!         ├── AggregateStore::insert_week_seed         ── log-only
//!         ├── MessageGenerator::generate               ── bucket-scoped
//!         └── per client (sequential):
//!               SmsSender::send → SendRecord            ── client-scoped
//! ```
//! No retries, no parallel fan-out, no cancellation mid-run. The design
//! assumes at most one invocation in flight; overlapping runs can see a
//! stale cooldown snapshot (the ledger is read once per bucket).

use std::sync::Arc;

use bucketsend_core::traits::{
    AggregateStore, BucketStore, MessageGenerator, ProfileStore, SendRecordStore, SmsSender,
};

pub mod dispatch;
pub mod eligibility;
pub mod run;

pub use dispatch::BucketOutcome;
pub use eligibility::{Eligibility, EligibilityGate, SkipReason};
pub use run::{run_pipeline, run_pipeline_at, RunReport};

/// The external collaborators one run is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub buckets: Arc<dyn BucketStore>,
    pub ledger: Arc<dyn SendRecordStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub aggregates: Arc<dyn AggregateStore>,
    pub copygen: Arc<dyn MessageGenerator>,
    pub sms: Arc<dyn SmsSender>,
}
