use std::sync::Arc;

use chrono::{ NaiveDate, NaiveTime, TimeZone, Utc };
use sea_orm::prelude::{ DateTimeUtc, Decimal };
use uuid::Uuid;

use crate::db::entity::{ schedule, schedule_index };
use crate::db::{ NewSchedule, ScheduleIndexStore, ShardManager };
use crate::enums::Interval;
use crate::error::{ AppError, Result };
use crate::services::recipient_service::validate_wallet;

/// Validated input for the create-schedule path.
#[derive(Debug, Clone)]
pub struct CreateScheduleRequest {
    pub name: Option<String>,
    pub recipient: String,
    pub amount: Decimal,
    pub currency: String,
    pub interval: Interval,
    pub interval_ms: Option<i64>,
    pub start_date: NaiveDate,
    pub time_of_day: Option<NaiveTime>,
    pub times: Option<i32>,
    pub note: Option<String>,
}

/// Standing-order management: creation (shard append + index mirror),
/// listing, and cancellation. Advancement after a fire belongs to the
/// dispatcher.
pub struct ScheduleService {
    shards: Arc<ShardManager>,
    index: Arc<ScheduleIndexStore>,
}

impl ScheduleService {
    pub fn new(shards: Arc<ShardManager>, index: Arc<ScheduleIndexStore>) -> Self {
        Self { shards, index }
    }

    /// Create a schedule: validate, append to the owning shard, then mirror
    /// into the dispatch index. The shard write is authoritative; if the
    /// index write fails the shard record stays and the caller sees a
    /// recoverable error.
    pub async fn create(
        &self,
        user_address: &str,
        request: CreateScheduleRequest
    ) -> Result<schedule::Model> {
        validate_request(&request)?;

        let next_run = first_run(request.start_date, request.time_of_day);
        let shard = self.shards.shard(user_address).await;

        let row = shard.append_schedule(NewSchedule {
            name: request.name,
            recipient: request.recipient,
            amount: request.amount,
            currency: request.currency,
            interval: request.interval.to_string(),
            interval_ms: request.interval_ms,
            start_date: request.start_date,
            time_of_day: request.time_of_day,
            times_total: request.times,
            note: request.note,
            next_run,
        }).await?;

        if let Err(e) = self.index.put(to_index_entry(&row)).await {
            tracing::warn!(
                schedule_id = %row.id,
                error = %e,
                "schedule stored but index write failed; retry schedule creation"
            );
            return Err(
                AppError::Internal(
                    format!("schedule {} saved but not yet indexed; retry to index it", row.id)
                )
            );
        }

        Ok(row)
    }

    pub async fn list(&self, user_address: &str) -> Result<Vec<schedule::Model>> {
        self.shards.shard(user_address).await.list_schedules().await
    }

    /// Delete a standing order: drop the index entry so no further fires
    /// happen, then remove the shard record. Past transactions keep the
    /// schedule id for attribution.
    pub async fn cancel(&self, user_address: &str, schedule_id: Uuid) -> Result<()> {
        let shard = self.shards.shard(user_address).await;

        // Ownership check before touching the global index.
        shard.get_schedule(schedule_id).await?;

        self.index.delete(schedule_id).await?;
        shard.delete_schedule(schedule_id).await?;

        Ok(())
    }
}

/// First fire instant: the start date combined with the requested time of
/// day (midnight when unspecified), interpreted in UTC.
pub fn first_run(start_date: NaiveDate, time_of_day: Option<NaiveTime>) -> DateTimeUtc {
    let time = time_of_day.unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default());
    Utc.from_utc_datetime(&start_date.and_time(time))
}

/// Project a shard schedule into its dispatch-index entry.
pub fn to_index_entry(row: &schedule::Model) -> schedule_index::Model {
    schedule_index::Model {
        schedule_id: row.id,
        user_address: row.user_address.clone(),
        next_run: row.next_run,
        recipient: row.recipient.clone(),
        amount: row.amount,
        currency: row.currency.clone(),
        interval: row.interval.clone(),
        interval_ms: row.interval_ms,
        times_remaining: row.times_remaining,
        name: row.name.clone(),
        note: row.note.clone(),
        created_at: row.created_at,
    }
}

fn validate_request(request: &CreateScheduleRequest) -> Result<()> {
    if request.recipient.trim().is_empty() {
        return Err(AppError::Validation("recipient must not be empty".to_string()));
    }
    validate_wallet(&request.recipient)?;

    if request.amount <= Decimal::ZERO {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }

    if request.interval == Interval::Custom {
        match request.interval_ms {
            Some(ms) if ms > 0 => {}
            _ => {
                return Err(
                    AppError::Validation(
                        "custom interval requires a positive intervalMs".to_string()
                    )
                );
            }
        }
    }

    if let Some(times) = request.times {
        if times <= 0 {
            return Err(AppError::Validation("times must be positive".to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn request() -> CreateScheduleRequest {
        CreateScheduleRequest {
            name: Some("rent".to_string()),
            recipient: "0x0000000000000000000000000000000000000001".to_string(),
            amount: Decimal::from_str("25.50").unwrap(),
            currency: "USDC".to_string(),
            interval: Interval::Monthly,
            interval_ms: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            time_of_day: None,
            times: Some(12),
            note: None,
        }
    }

    #[test]
    fn test_first_run_defaults_to_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let run = first_run(date, None);
        assert_eq!(run.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_first_run_honors_time_of_day() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let run = first_run(date, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(run.to_rfc3339(), "2025-01-01T09:30:00+00:00");
    }

    #[test]
    fn test_validation_accepts_well_formed_request() {
        validate_request(&request()).unwrap();
    }

    #[test]
    fn test_validation_rejects_bad_amounts() {
        let mut bad = request();
        bad.amount = Decimal::ZERO;
        assert!(validate_request(&bad).is_err());

        bad.amount = Decimal::from_str("-1").unwrap();
        assert!(validate_request(&bad).is_err());
    }

    #[test]
    fn test_validation_rejects_custom_without_interval_ms() {
        let mut bad = request();
        bad.interval = Interval::Custom;
        bad.interval_ms = None;
        assert!(validate_request(&bad).is_err());

        bad.interval_ms = Some(0);
        assert!(validate_request(&bad).is_err());

        bad.interval_ms = Some(3_600_000);
        validate_request(&bad).unwrap();
    }

    #[test]
    fn test_validation_rejects_non_positive_times() {
        let mut bad = request();
        bad.times = Some(0);
        assert!(validate_request(&bad).is_err());
    }
}
