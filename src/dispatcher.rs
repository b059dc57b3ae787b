use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{ DateTime, Duration, Utc };
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::interval;

use crate::config::Config;
use crate::db::entity::schedule_index;
use crate::db::{ NewTransaction, SchedulePatch, ScheduleIndexStore, ShardManager };
use crate::enums::{ Interval, TxKind, TxStatus };
use crate::error::Result;
use crate::services::executor_client::{ DispatchPayload, ExecutorClient };

/// Periodic scanner over the schedule index. After creation it is the only
/// writer of `next_run` and `times_remaining`, both in the index and in the
/// owning shards.
///
/// Ticks never overlap: the loop awaits a full tick, including every fire it
/// fanned out, before sleeping again. That is the duplicate-suppression
/// strategy; a schedule whose `next_run` has not yet been advanced can never
/// be seen by a second concurrent tick.
#[derive(Clone)]
pub struct Dispatcher {
    shards: Arc<ShardManager>,
    index: Arc<ScheduleIndexStore>,
    executor: Arc<ExecutorClient>,
    usdc_address: String,
    tick_interval: StdDuration,
    retry_backoff_seconds: i64,
    max_concurrency: usize,
}

#[derive(Debug, Default)]
pub struct TickSummary {
    pub scanned: usize,
    pub due: usize,
    pub fired: usize,
    pub failed: usize,
}

/// Bookkeeping to apply after a successful fire.
#[derive(Debug, PartialEq)]
struct FirePlan {
    next_run: DateTime<Utc>,
    times_remaining: Option<i32>,
    retire: bool,
}

impl Dispatcher {
    pub fn new(
        shards: Arc<ShardManager>,
        index: Arc<ScheduleIndexStore>,
        executor: Arc<ExecutorClient>,
        config: &Config
    ) -> Self {
        Self {
            shards,
            index,
            executor,
            usdc_address: config.usdc_address.clone(),
            tick_interval: StdDuration::from_secs(config.dispatch_interval_seconds),
            retry_backoff_seconds: config.retry_backoff_seconds,
            max_concurrency: config.dispatch_max_concurrency.max(1),
        }
    }

    pub async fn run(self) {
        let mut ticker = interval(self.tick_interval);

        loop {
            ticker.tick().await;

            match self.tick().await {
                Ok(summary) => {
                    if summary.due > 0 {
                        tracing::info!(
                            scanned = summary.scanned,
                            due = summary.due,
                            fired = summary.fired,
                            failed = summary.failed,
                            "dispatch tick finished"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!("dispatch tick failed: {}", e);
                }
            }
        }
    }

    /// One scan: list the index, fan out every due entry to a bounded worker
    /// pool, and wait for all of them.
    pub async fn tick(&self) -> Result<TickSummary> {
        let now = Utc::now();
        let entries = self.index.list_all().await?;
        let scanned = entries.len();

        let due = select_due(entries, now);
        let mut summary = TickSummary {
            scanned,
            due: due.len(),
            ..Default::default()
        };

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut fires = JoinSet::new();

        for entry in due {
            let semaphore = semaphore.clone();
            let dispatcher = self.clone();

            fires.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return false;
                    }
                };
                dispatcher.fire(entry).await
            });
        }

        while let Some(joined) = fires.join_next().await {
            match joined {
                Ok(true) => {
                    summary.fired += 1;
                }
                Ok(false) => {
                    summary.failed += 1;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("fire task panicked: {}", e);
                }
            }
        }

        Ok(summary)
    }

    /// One attempt to execute a due schedule. Returns whether the fire
    /// succeeded; bookkeeping errors are logged, not propagated, so one bad
    /// schedule cannot stall the rest of the tick.
    async fn fire(&self, entry: schedule_index::Model) -> bool {
        let payload = DispatchPayload {
            schedule_id: entry.schedule_id,
            user_address: entry.user_address.clone(),
            recipient: entry.recipient.clone(),
            amount: entry.amount,
            token: self.usdc_address.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };

        tracing::debug!(
            schedule_id = %entry.schedule_id,
            user = %entry.user_address,
            "dispatching due schedule"
        );

        let outcome = self.executor.dispatch(&payload).await;
        let now = Utc::now();

        match outcome {
            Ok(response) if response.ok => {
                let tx_hash = response.tx_hash.unwrap_or_default();
                if let Err(e) = self.complete_fire(&entry, tx_hash).await {
                    tracing::error!(
                        schedule_id = %entry.schedule_id,
                        "failed to record successful fire: {}",
                        e
                    );
                }
                true
            }
            Ok(response) => {
                let note = response.error.unwrap_or_else(||
                    "executor rejected the dispatch".to_string()
                );
                self.fail_fire(&entry, note, now).await;
                false
            }
            Err(e) => {
                self.fail_fire(&entry, e.to_string(), now).await;
                false
            }
        }
    }

    async fn complete_fire(&self, entry: &schedule_index::Model, tx_hash: String) -> Result<()> {
        let shard = self.shards.shard(&entry.user_address).await;

        shard.append_transaction(NewTransaction {
            kind: TxKind::Recurring,
            name: entry.name.clone(),
            address: entry.recipient.clone(),
            amount: entry.amount,
            currency: entry.currency.clone(),
            status: TxStatus::Completed,
            tx_hash: Some(tx_hash),
            schedule_id: Some(entry.schedule_id),
            note: entry.note.clone(),
        }).await?;

        let plan = plan_success(entry);

        if plan.retire {
            self.index.delete(entry.schedule_id).await?;
            shard.update_schedule(entry.schedule_id, SchedulePatch {
                next_run: Some(plan.next_run),
                times_remaining: Some(0),
                active: Some(false),
            }).await?;

            tracing::info!(schedule_id = %entry.schedule_id, "schedule completed its final fire");
        } else {
            let mut updated = entry.clone();
            updated.next_run = plan.next_run;
            updated.times_remaining = plan.times_remaining;
            self.index.put(updated).await?;

            shard.update_schedule(entry.schedule_id, SchedulePatch {
                next_run: Some(plan.next_run),
                times_remaining: plan.times_remaining,
                active: None,
            }).await?;
        }

        Ok(())
    }

    /// Record the failure and push `next_run` out by the retry backoff.
    /// `times_remaining` is never charged for a failed attempt.
    async fn fail_fire(&self, entry: &schedule_index::Model, note: String, now: DateTime<Utc>) {
        tracing::warn!(
            schedule_id = %entry.schedule_id,
            user = %entry.user_address,
            "fire failed, scheduling retry: {}",
            note
        );

        let next_run = plan_retry(now, self.retry_backoff_seconds);
        let shard = self.shards.shard(&entry.user_address).await;

        let recorded = shard.append_transaction(NewTransaction {
            kind: TxKind::Recurring,
            name: entry.name.clone(),
            address: entry.recipient.clone(),
            amount: entry.amount,
            currency: entry.currency.clone(),
            status: TxStatus::Failed,
            tx_hash: None,
            schedule_id: Some(entry.schedule_id),
            note: Some(note),
        }).await;

        if let Err(e) = recorded {
            tracing::error!(schedule_id = %entry.schedule_id, "failed to record failed fire: {}", e);
        }

        let mut updated = entry.clone();
        updated.next_run = next_run;
        if let Err(e) = self.index.put(updated).await {
            tracing::error!(schedule_id = %entry.schedule_id, "failed to reschedule retry: {}", e);
        }

        let patched = shard.update_schedule(entry.schedule_id, SchedulePatch {
            next_run: Some(next_run),
            ..Default::default()
        }).await;

        if let Err(e) = patched {
            tracing::error!(schedule_id = %entry.schedule_id, "failed to patch schedule: {}", e);
        }
    }
}

/// Entries whose `next_run` has passed. One tick fires each at most once;
/// a schedule overdue by several periods catches up one fire per tick.
fn select_due(
    entries: Vec<schedule_index::Model>,
    now: DateTime<Utc>
) -> Vec<schedule_index::Model> {
    entries
        .into_iter()
        .filter(|entry| entry.next_run <= now)
        .collect()
}

fn plan_success(entry: &schedule_index::Model) -> FirePlan {
    let interval = Interval::parse_or_daily(Some(entry.interval.as_str()));

    // Advance from the nominal next_run, not from the wall clock, so the
    // schedule keeps its anchor (a 09:00 schedule fired at 09:04 still
    // targets 09:00 tomorrow). A long outage is caught up one interval per
    // fire until next_run passes now again.
    let next_run = interval.advance(entry.next_run, entry.interval_ms);

    match entry.times_remaining {
        Some(remaining) => {
            let left = (remaining - 1).max(0);
            FirePlan {
                next_run,
                times_remaining: Some(left),
                retire: left == 0,
            }
        }
        None =>
            FirePlan {
                next_run,
                times_remaining: None,
                retire: false,
            },
    }
}

fn plan_retry(now: DateTime<Utc>, backoff_seconds: i64) -> DateTime<Utc> {
    now + Duration::seconds(backoff_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::prelude::Decimal;
    use uuid::Uuid;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn entry(
        interval: &str,
        next_run: DateTime<Utc>,
        times_remaining: Option<i32>
    ) -> schedule_index::Model {
        schedule_index::Model {
            schedule_id: Uuid::new_v4(),
            user_address: "0x0000000000000000000000000000000000000a11".to_string(),
            next_run,
            recipient: "0x0000000000000000000000000000000000000b22".to_string(),
            amount: Decimal::from(5),
            currency: "USDC".to_string(),
            interval: interval.to_string(),
            interval_ms: None,
            times_remaining,
            name: None,
            note: None,
            created_at: at(2025, 1, 1, 0, 0),
        }
    }

    #[test]
    fn test_select_due_keeps_past_and_present() {
        let now = at(2025, 1, 2, 9, 0);
        let entries = vec![
            entry("daily", at(2025, 1, 1, 9, 0), None),
            entry("daily", at(2025, 1, 2, 9, 0), None),
            entry("daily", at(2025, 1, 3, 9, 0), None)
        ];

        let due = select_due(entries, now);
        assert_eq!(due.len(), 2);
        assert!(due.iter().all(|e| e.next_run <= now));
    }

    #[test]
    fn test_success_decrements_and_advances() {
        let fired = entry("daily", at(2025, 1, 1, 9, 0), Some(3));
        let plan = plan_success(&fired);

        assert_eq!(plan.next_run, at(2025, 1, 2, 9, 0));
        assert_eq!(plan.times_remaining, Some(2));
        assert!(!plan.retire);
    }

    #[test]
    fn test_final_fire_retires_schedule() {
        let fired = entry("daily", at(2025, 1, 3, 9, 0), Some(1));
        let plan = plan_success(&fired);

        assert_eq!(plan.times_remaining, Some(0));
        assert!(plan.retire);
    }

    #[test]
    fn test_unlimited_schedule_never_retires() {
        let fired = entry("weekly", at(2025, 1, 1, 0, 0), None);
        let plan = plan_success(&fired);

        assert_eq!(plan.next_run, at(2025, 1, 8, 0, 0));
        assert_eq!(plan.times_remaining, None);
        assert!(!plan.retire);
    }

    #[test]
    fn test_monthly_fire_clamps_to_month_end() {
        let fired = entry("monthly", at(2025, 1, 31, 0, 0), Some(12));
        let plan = plan_success(&fired);
        assert_eq!(plan.next_run, at(2025, 2, 28, 0, 0));

        let mut again = fired;
        again.next_run = plan.next_run;
        let plan = plan_success(&again);
        assert_eq!(plan.next_run, at(2025, 3, 28, 0, 0));
    }

    #[test]
    fn test_unknown_interval_advances_daily() {
        let fired = entry("hourly-ish", at(2025, 1, 1, 9, 0), None);
        let plan = plan_success(&fired);
        assert_eq!(plan.next_run, at(2025, 1, 2, 9, 0));
    }

    #[test]
    fn test_custom_interval_uses_interval_ms() {
        let mut fired = entry("custom", at(2025, 1, 1, 9, 0), None);
        fired.interval_ms = Some(6 * 60 * 60 * 1000);
        let plan = plan_success(&fired);
        assert_eq!(plan.next_run, at(2025, 1, 1, 15, 0));
    }

    #[test]
    fn test_retry_is_backoff_from_now_not_from_next_run() {
        let now = at(2025, 1, 1, 12, 0);
        assert_eq!(plan_retry(now, 600), at(2025, 1, 1, 12, 10));
    }

    #[test]
    fn test_overdue_schedule_catches_up_one_interval_per_fire() {
        // Due since Jan 1, fired on Jan 3: next_run lands on Jan 2 and the
        // schedule is due again on the very next tick.
        let fired = entry("daily", at(2025, 1, 1, 9, 0), Some(3));
        let plan = plan_success(&fired);
        assert_eq!(plan.next_run, at(2025, 1, 2, 9, 0));
    }
}
