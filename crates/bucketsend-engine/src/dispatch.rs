//! Per-bucket dispatch: gate the candidates, generate one shared
//! message, then send sequentially, recording every attempt.
//!
//! An `Err` from here aborts this bucket only; the run loop logs it and
//! moves on. Individual send failures never abort the bucket's
//! remaining candidates.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};

use bucketsend_core::config::BucketSendConfig;
use bucketsend_core::error::{BucketSendError, Result};
use bucketsend_core::types::{NudgeWeekSeed, OutboundSms, SendRecord, SmsCorrelation, SmartBucket};
use bucketsend_scheduler::windows::RunWindow;

use crate::eligibility::{Eligibility, EligibilityGate};
use crate::Collaborators;

/// Counters accumulated while processing one bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketOutcome {
    pub eligible: usize,
    pub skipped: usize,
    pub sent: usize,
    pub failed: usize,
}

impl BucketOutcome {
    pub fn absorb(&mut self, other: BucketOutcome) {
        self.eligible += other.eligible;
        self.skipped += other.skipped;
        self.sent += other.sent;
        self.failed += other.failed;
    }
}

/// One run's frozen context shared by every bucket.
pub struct RunContext<'a> {
    pub config: &'a BucketSendConfig,
    pub run: RunWindow,
    pub now_utc: DateTime<Utc>,
    pub local_now: NaiveDateTime,
    pub today_iso: u32,
    pub iso_week: String,
}

impl RunContext<'_> {
    fn gate(&self) -> EligibilityGate {
        EligibilityGate {
            cooldown: chrono::Duration::days(self.config.cooldown_days),
            today_iso: self.today_iso,
            local_now: self.local_now,
            now_utc: self.now_utc,
            run: self.run,
        }
    }
}

/// Rewrite the booking link with the candidate's single-use token.
/// Candidates without a token get the shared message unmodified.
fn personalize(shared: &str, booking_link: &str, token: Option<&str>) -> String {
    match token {
        Some(token) if !token.is_empty() => {
            shared.replace(booking_link, &format!("{booking_link}?nudge={token}"))
        }
        _ => shared.to_string(),
    }
}

/// Latest successful send per client, reduced from the bucket's ledger.
fn latest_success_by_client(
    receipts: &[bucketsend_core::types::SendReceipt],
) -> HashMap<String, DateTime<Utc>> {
    let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();
    for receipt in receipts {
        let Some(client_id) = &receipt.client_id else { continue };
        latest
            .entry(client_id.clone())
            .and_modify(|at| {
                if receipt.created_at > *at {
                    *at = receipt.created_at;
                }
            })
            .or_insert(receipt.created_at);
    }
    latest
}

/// Process one bucket end to end.
pub async fn process_bucket(
    ctx: &RunContext<'_>,
    c: &Collaborators,
    bucket: &SmartBucket,
) -> Result<BucketOutcome> {
    let mut outcome = BucketOutcome::default();

    // Cooldown snapshot: read once per bucket, never re-read mid-bucket.
    let receipts = c.ledger.successful_sends(&bucket.id).await?;
    let latest = latest_success_by_client(&receipts);

    let gate = ctx.gate();
    let mut eligible = Vec::new();
    for candidate in &bucket.clients {
        let last = latest.get(&candidate.client_id).copied();
        match gate.evaluate(&candidate.bucket_tag, last) {
            Eligibility::Eligible => eligible.push(candidate),
            Eligibility::Skip(reason) => {
                tracing::debug!(
                    "⏭️ Skipping client {} in bucket {}: {}",
                    candidate.client_id,
                    bucket.id,
                    reason.as_str()
                );
                outcome.skipped += 1;
            }
        }
    }

    if eligible.is_empty() {
        tracing::info!("📦 Bucket {}: no eligible clients this run", bucket.id);
        return Ok(outcome);
    }

    let profile = c
        .profiles
        .profile(&bucket.user_id)
        .await?
        .ok_or_else(|| {
            BucketSendError::Profile(format!("No profile for owner {}", bucket.user_id))
        })?;

    // Seed the weekly aggregate row; a downstream click tracker
    // increments it. Non-fatal if it fails.
    let seed = NudgeWeekSeed::zeroed(&bucket.user_id, &ctx.iso_week);
    if let Err(e) = c.aggregates.insert_week_seed(&seed).await {
        tracing::warn!("⚠️ Aggregate seed insert failed for owner {}: {e}", bucket.user_id);
    }

    let booking_link = ctx.config.booking_link(&profile.username);
    let shared = c.copygen.generate(&profile, &booking_link).await?;

    tracing::info!(
        "📦 Bucket {}: {} eligible candidate(s), owner {}",
        bucket.id,
        eligible.len(),
        bucket.user_id
    );

    let mut failed_numbers: Vec<String> = Vec::new();
    for candidate in eligible {
        if candidate.phone.trim().is_empty() {
            // Not a provider failure: never recorded, never listed.
            tracing::debug!("📵 Client {} has no phone number, skipping", candidate.client_id);
            outcome.skipped += 1;
            continue;
        }
        outcome.eligible += 1;

        let body = format!(
            "{}\n\n{}",
            personalize(&shared, &booking_link, candidate.nudge_token.as_deref()),
            ctx.config.unsubscribe_footer
        );
        let sms = OutboundSms {
            to: candidate.phone.clone(),
            body: body.clone(),
            correlation: Some(SmsCorrelation {
                user_id: bucket.user_id.clone(),
                client_id: candidate.client_id.clone(),
                bucket_id: bucket.id.clone(),
                message: body.clone(),
            }),
        };

        match c.sms.send(&sms).await {
            Ok(sid) => {
                tracing::info!("✅ Sent to {} (sid {})", candidate.phone, sid);
                outcome.sent += 1;
                let record = SendRecord::new(
                    &bucket.user_id,
                    &bucket.id,
                    Some(&candidate.client_id),
                    &candidate.phone,
                    true,
                    &ctx.config.purpose,
                    &body,
                    None,
                );
                if let Err(e) = c.ledger.insert(&record).await {
                    tracing::warn!("⚠️ Ledger insert failed for {}: {e}", candidate.phone);
                }
            }
            Err(e) => {
                tracing::warn!("❌ Send failed for {}: {e}", candidate.phone);
                outcome.failed += 1;
                failed_numbers.push(candidate.phone.clone());
                let record = SendRecord::new(
                    &bucket.user_id,
                    &bucket.id,
                    Some(&candidate.client_id),
                    &candidate.phone,
                    false,
                    &ctx.config.purpose,
                    &body,
                    Some(e.to_string()),
                );
                if let Err(e) = c.ledger.insert(&record).await {
                    tracing::warn!("⚠️ Ledger insert failed for {}: {e}", candidate.phone);
                }
            }
        }
    }

    // Append (not dedup) this run's failures onto the bucket record.
    if !failed_numbers.is_empty() {
        match c.buckets.failed_numbers(&bucket.id).await {
            Ok(mut current) => {
                current.extend(failed_numbers.iter().cloned());
                if let Err(e) = c.buckets.set_failed_numbers(&bucket.id, &current).await {
                    tracing::warn!("⚠️ Failed-number update failed for bucket {}: {e}", bucket.id);
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed-number read failed for bucket {}: {e}", bucket.id);
            }
        }
    }

    Ok(outcome)
}
