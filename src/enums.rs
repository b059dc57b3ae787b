use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─── Interval ────────────────────────────────────────────────────────

/// Recurrence cadence for a payment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

impl Interval {
    /// Canonical string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
            Interval::Yearly => "yearly",
            Interval::Custom => "custom",
        }
    }

    /// Lenient parse for values read back from storage. Anything
    /// unrecognized (or absent) falls back to daily.
    pub fn parse_or_daily(value: Option<&str>) -> Interval {
        value
            .and_then(|v| v.parse::<Interval>().ok())
            .unwrap_or(Interval::Daily)
    }

    /// Next occurrence strictly after `from`.
    ///
    /// Monthly and yearly steps are calendar-aware: the day-of-month is
    /// clamped to the target month's length (Jan 31 -> Feb 28 -> Mar 28).
    /// `interval_ms` only applies to custom cadences. The result is always
    /// strictly greater than `from`.
    pub fn advance(&self, from: DateTime<Utc>, interval_ms: Option<i64>) -> DateTime<Utc> {
        let next = match self {
            Interval::Daily => from + Duration::days(1),
            Interval::Weekly => from + Duration::days(7),
            Interval::Monthly => from
                .checked_add_months(Months::new(1))
                .unwrap_or(from + Duration::days(30)),
            Interval::Yearly => from
                .checked_add_months(Months::new(12))
                .unwrap_or(from + Duration::days(365)),
            Interval::Custom => match interval_ms {
                Some(ms) if ms > 0 => from + Duration::milliseconds(ms),
                _ => from + Duration::days(1),
            },
        };

        if next > from {
            next
        } else {
            from + Duration::days(1)
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Interval::Daily),
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            "yearly" | "annually" => Ok(Interval::Yearly),
            "custom" => Ok(Interval::Custom),
            _ => Err(AppError::Validation(format!(
                "Invalid interval: {}. Supported: daily, weekly, monthly, yearly, custom",
                s
            ))),
        }
    }
}

// ─── TxKind ──────────────────────────────────────────────────────────

/// How a transaction record originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    SendOnce,
    Recurring,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::SendOnce => "send_once",
            TxKind::Recurring => "recurring",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "send_once" => Ok(TxKind::SendOnce),
            "recurring" => Ok(TxKind::Recurring),
            _ => Err(AppError::Validation(format!(
                "Invalid transaction kind: {}. Supported: send_once, recurring",
                s
            ))),
        }
    }
}

// ─── TxStatus ────────────────────────────────────────────────────────

/// Outcome recorded for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Completed,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Completed => "completed",
            TxStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(TxStatus::Completed),
            "failed" => Ok(TxStatus::Failed),
            _ => Err(AppError::Validation(format!("Invalid tx status: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn daily_advances_one_day() {
        let from = at(2025, 1, 1, 9, 0);
        assert_eq!(Interval::Daily.advance(from, None), at(2025, 1, 2, 9, 0));
    }

    #[test]
    fn weekly_advances_seven_days() {
        let from = at(2025, 1, 1, 9, 0);
        assert_eq!(Interval::Weekly.advance(from, None), at(2025, 1, 8, 9, 0));
    }

    #[test]
    fn monthly_clamps_to_end_of_month() {
        let jan = at(2025, 1, 31, 0, 0);
        let feb = Interval::Monthly.advance(jan, None);
        assert_eq!(feb, at(2025, 2, 28, 0, 0));

        // After a clamp the day stays at the clamped value.
        let mar = Interval::Monthly.advance(feb, None);
        assert_eq!(mar, at(2025, 3, 28, 0, 0));
    }

    #[test]
    fn yearly_advances_twelve_months() {
        let from = at(2024, 2, 29, 12, 0);
        // Leap day clamps to Feb 28 the following year.
        assert_eq!(Interval::Yearly.advance(from, None), at(2025, 2, 28, 12, 0));
    }

    #[test]
    fn custom_uses_interval_ms() {
        let from = at(2025, 1, 1, 0, 0);
        let next = Interval::Custom.advance(from, Some(90 * 60 * 1000));
        assert_eq!(next, at(2025, 1, 1, 1, 30));
    }

    #[test]
    fn custom_without_ms_falls_back_to_daily() {
        let from = at(2025, 1, 1, 0, 0);
        assert_eq!(Interval::Custom.advance(from, None), at(2025, 1, 2, 0, 0));
        assert_eq!(Interval::Custom.advance(from, Some(0)), at(2025, 1, 2, 0, 0));
        assert_eq!(Interval::Custom.advance(from, Some(-5)), at(2025, 1, 2, 0, 0));
    }

    #[test]
    fn advance_is_strictly_increasing() {
        let mut cursor = at(2025, 1, 31, 9, 0);
        for _ in 0..24 {
            let next = Interval::Monthly.advance(cursor, None);
            assert!(next > cursor);
            cursor = next;
        }
    }

    #[test]
    fn parse_or_daily_defaults_unknown_values() {
        assert_eq!(Interval::parse_or_daily(Some("weekly")), Interval::Weekly);
        assert_eq!(Interval::parse_or_daily(Some("fortnightly")), Interval::Daily);
        assert_eq!(Interval::parse_or_daily(None), Interval::Daily);
    }

    #[test]
    fn interval_round_trips_through_strings() {
        for interval in [
            Interval::Daily,
            Interval::Weekly,
            Interval::Monthly,
            Interval::Yearly,
            Interval::Custom,
        ] {
            assert_eq!(interval.as_str().parse::<Interval>().unwrap(), interval);
        }
    }
}
