//! The full run pipeline and its JSON report.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use bucketsend_core::config::BucketSendConfig;
use bucketsend_core::error::{BucketSendError, Result};
use bucketsend_scheduler::week::{iso_week_string, iso_weekday};
use bucketsend_scheduler::windows::classify;

use crate::dispatch::{process_bucket, BucketOutcome, RunContext};
use crate::Collaborators;

/// Aggregate summary returned to the trigger (HTTP 200 body / CLI
/// stdout). Field names match the shape downstream consumers already
/// parse, including the historical `torontoTime` key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub message: String,
    pub iso_week: String,
    /// ISO weekday of the run, Monday = 1 … Sunday = 7.
    pub day: u32,
    pub effective_batch: String,
    pub mode: String,
    pub toronto_time: String,
    pub total_eligible: usize,
    pub total_skipped: usize,
    pub total_sent: usize,
    pub total_failed: usize,
}

/// Run the pipeline at the current wall-clock time.
///
/// Operational precondition: at most one invocation in flight. The
/// engine takes no lock; overlapping runs can race on the cooldown
/// snapshot.
pub async fn run_pipeline(config: &BucketSendConfig, c: &Collaborators) -> Result<RunReport> {
    run_pipeline_at(config, c, Utc::now()).await
}

/// Run the pipeline as of a specific instant. Split out so tests and
/// backfills can pin the clock.
pub async fn run_pipeline_at(
    config: &BucketSendConfig,
    c: &Collaborators,
    now_utc: DateTime<Utc>,
) -> Result<RunReport> {
    let tz: Tz = config
        .timezone
        .parse()
        .map_err(|_| BucketSendError::Config(format!("Invalid timezone: {}", config.timezone)))?;
    let local = now_utc.with_timezone(&tz);
    let local_now = local.naive_local();

    let run = classify(local_now);
    let iso_week = iso_week_string(local_now.date());
    let today_iso = iso_weekday(local_now.date());

    tracing::info!(
        "🪣 Nudge run starting: week {}, day {}, batch {}, mode {}",
        iso_week,
        today_iso,
        run.effective_batch.label(),
        run.mode()
    );

    // No bucket list means no safe partial action: fatal for the run.
    let buckets = c.buckets.active_buckets(&iso_week).await?;
    tracing::info!("🪣 {} active bucket(s) for {}", buckets.len(), iso_week);

    let ctx = RunContext {
        config,
        run,
        now_utc,
        local_now,
        today_iso,
        iso_week: iso_week.clone(),
    };

    let mut totals = BucketOutcome::default();
    for bucket in &buckets {
        match process_bucket(&ctx, c, bucket).await {
            Ok(outcome) => totals.absorb(outcome),
            Err(e) => {
                // Bucket-scoped: log and keep going.
                tracing::error!("❌ Bucket {} aborted: {e}", bucket.id);
            }
        }
    }

    let report = RunReport {
        message: format!("Smart bucket nudge run complete ({} bucket(s))", buckets.len()),
        iso_week,
        day: today_iso,
        effective_batch: run.effective_batch.label().to_string(),
        mode: run.mode().to_string(),
        toronto_time: local.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        total_eligible: totals.eligible,
        total_skipped: totals.skipped,
        total_sent: totals.sent,
        total_failed: totals.failed,
    };

    tracing::info!(
        "🏁 Run finished: {} eligible, {} skipped, {} sent, {} failed",
        report.total_eligible,
        report.total_skipped,
        report.total_sent,
        report.total_failed
    );

    Ok(report)
}
