use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{ NaiveDate, NaiveTime, Utc };
use sea_orm::prelude::Decimal;
use serde::{ Deserialize, Serialize };

use crate::db::entity::recipient;
use crate::error::{ AppError, Result };
use crate::services::recipient_service::{ validate_wallet, RecipientService, ResolveOutcome };

/// Candidate intent as produced by the opaque natural-language parser. All
/// fields arrive loosely typed; canonicalization tightens them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedIntent {
    pub intent: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub interval: Option<String>,
    pub interval_ms: Option<i64>,
    pub start_date: Option<String>,
    pub time_of_day: Option<String>,
    pub times: Option<i32>,
    pub note: Option<String>,
}

/// Fully resolved intent: recipient address filled, amount validated,
/// start date defaulted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalIntent {
    pub intent: String,
    pub name: Option<String>,
    pub address: String,
    pub amount: Decimal,
    pub currency: String,
    pub interval: Option<String>,
    pub interval_ms: Option<i64>,
    pub start_date: NaiveDate,
    pub time_of_day: Option<NaiveTime>,
    pub times: Option<i32>,
    pub note: Option<String>,
}

/// Result of resolving a parsed intent against the user's recipients.
#[derive(Debug, Clone)]
pub enum IntentOutcome {
    Resolved(CanonicalIntent),
    AmbiguousRecipient {
        name: String,
        options: Vec<recipient::Model>,
    },
    RecipientMissing {
        name: String,
    },
}

/// Seam to the external natural-language parser.
#[async_trait]
pub trait IntentParser: Send + Sync {
    async fn parse(&self, text: &str) -> Result<ParsedIntent>;
}

/// Production parser client. The parser itself is an external collaborator;
/// this only carries the transport.
pub struct HttpIntentParser {
    client: reqwest::Client,
    url: String,
}

impl HttpIntentParser {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client
            ::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build parser client: {}", e)))?;

        Ok(Self { client, url })
    }
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    text: &'a str,
}

#[async_trait]
impl IntentParser for HttpIntentParser {
    async fn parse(&self, text: &str) -> Result<ParsedIntent> {
        let response = self.client
            .post(&self.url)
            .json(&ParseRequest { text })
            .send().await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout("intent parser timed out".to_string())
                } else {
                    AppError::Parser(format!("intent parser unreachable: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(AppError::Parser(format!("intent parser returned {}", response.status())));
        }

        response
            .json::<ParsedIntent>().await
            .map_err(|e| AppError::Parser(format!("malformed parser response: {}", e)))
    }
}

/// Wraps the opaque parser: resolves spoken names to wallet addresses via
/// the user's shard and normalizes the envelope. Performs no persistence.
pub struct IntentService {
    parser: Arc<dyn IntentParser>,
    recipients: Arc<RecipientService>,
}

impl IntentService {
    pub fn new(parser: Arc<dyn IntentParser>, recipients: Arc<RecipientService>) -> Self {
        Self { parser, recipients }
    }

    pub async fn resolve(&self, user_address: &str, text: &str) -> Result<IntentOutcome> {
        let parsed = self.parser.parse(text).await?;

        let resolution = match (&parsed.address, &parsed.name) {
            (None, Some(name)) => {
                Some(self.recipients.resolve_by_name(user_address, name).await?)
            }
            _ => None,
        };

        canonicalize(parsed, resolution, Utc::now().date_naive())
    }
}

/// Tighten a parsed intent into its canonical form, or report why the
/// recipient could not be pinned down.
pub fn canonicalize(
    parsed: ParsedIntent,
    resolution: Option<ResolveOutcome>,
    today: NaiveDate
) -> Result<IntentOutcome> {
    let intent = match parsed.intent.as_deref() {
        Some("send_once") => "send_once".to_string(),
        Some("recurring_payment") => "recurring_payment".to_string(),
        Some(other) => {
            return Err(AppError::Validation(format!("unrecognized intent: {}", other)));
        }
        None => {
            return Err(AppError::Validation("parser produced no intent".to_string()));
        }
    };

    let address = match (parsed.address.clone(), resolution) {
        (Some(address), _) => {
            validate_wallet(&address)?;
            address.to_lowercase()
        }
        (None, Some(ResolveOutcome::Exact(found))) => found.wallet,
        (None, Some(ResolveOutcome::PartialUnique(found))) => found.wallet,
        (None, Some(ResolveOutcome::Ambiguous(options))) => {
            return Ok(IntentOutcome::AmbiguousRecipient {
                name: parsed.name.unwrap_or_default(),
                options,
            });
        }
        (None, Some(ResolveOutcome::NotFound)) => {
            return Ok(IntentOutcome::RecipientMissing {
                name: parsed.name.unwrap_or_default(),
            });
        }
        (None, None) => {
            return Err(AppError::Validation("no recipient name or address given".to_string()));
        }
    };

    let amount = parsed.amount.ok_or_else(||
        AppError::Validation("no amount recognized".to_string())
    )?;
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }

    if let Some(interval) = parsed.interval.as_deref() {
        interval.parse::<crate::enums::Interval>()?;
    }

    let start_date = match parsed.start_date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => today,
    };
    let time_of_day = parsed.time_of_day.as_deref().map(parse_time).transpose()?;

    Ok(
        IntentOutcome::Resolved(CanonicalIntent {
            intent,
            name: parsed.name,
            address,
            amount,
            currency: parsed.currency.unwrap_or_else(|| "USDC".to_string()),
            interval: parsed.interval,
            interval_ms: parsed.interval_ms,
            start_date,
            time_of_day,
            times: parsed.times,
            note: parsed.note,
        })
    )
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_|
        AppError::Validation(format!("unparseable start date: {}", raw))
    )
}

pub(crate) fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppError::Validation(format!("unparseable time of day: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn saved(name: &str, wallet: &str) -> recipient::Model {
        let now = Utc::now();
        recipient::Model {
            id: Uuid::new_v4(),
            user_address: "0xuser".to_string(),
            name: name.to_string(),
            wallet: wallet.to_string(),
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn parsed() -> ParsedIntent {
        ParsedIntent {
            intent: Some("recurring_payment".to_string()),
            name: Some("Sam".to_string()),
            amount: Some(Decimal::from(10)),
            interval: Some("weekly".to_string()),
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_resolved_name_fills_address() {
        let resolution = ResolveOutcome::Exact(
            saved("Sam", "0x0000000000000000000000000000000000000009")
        );

        match canonicalize(parsed(), Some(resolution), today()).unwrap() {
            IntentOutcome::Resolved(intent) => {
                assert_eq!(intent.address, "0x0000000000000000000000000000000000000009");
                assert_eq!(intent.start_date, today());
                assert_eq!(intent.currency, "USDC");
            }
            other => panic!("expected resolved intent, got {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_name_returns_options() {
        let resolution = ResolveOutcome::Ambiguous(
            vec![
                saved("Sam", "0x0000000000000000000000000000000000000001"),
                saved("Sam", "0x0000000000000000000000000000000000000002")
            ]
        );

        match canonicalize(parsed(), Some(resolution), today()).unwrap() {
            IntentOutcome::AmbiguousRecipient { name, options } => {
                assert_eq!(name, "Sam");
                assert_eq!(options.len(), 2);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_name_reports_missing() {
        match canonicalize(parsed(), Some(ResolveOutcome::NotFound), today()).unwrap() {
            IntentOutcome::RecipientMissing { name } => assert_eq!(name, "Sam"),
            other => panic!("expected missing recipient, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_address_skips_resolution() {
        let mut intent = parsed();
        intent.address = Some("0x0000000000000000000000000000000000000ABC".to_string());

        match canonicalize(intent, None, today()).unwrap() {
            IntentOutcome::Resolved(intent) => {
                assert_eq!(intent.address, "0x0000000000000000000000000000000000000abc");
            }
            other => panic!("expected resolved intent, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_amount_is_validation_error() {
        let mut intent = parsed();
        intent.amount = None;
        let resolution = ResolveOutcome::Exact(
            saved("Sam", "0x0000000000000000000000000000000000000009")
        );

        let err = canonicalize(intent, Some(resolution), today()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_explicit_dates_and_times_are_parsed() {
        let mut intent = parsed();
        intent.address = Some("0x0000000000000000000000000000000000000001".to_string());
        intent.start_date = Some("2025-12-24".to_string());
        intent.time_of_day = Some("09:00".to_string());

        match canonicalize(intent, None, today()).unwrap() {
            IntentOutcome::Resolved(intent) => {
                assert_eq!(intent.start_date, NaiveDate::from_ymd_opt(2025, 12, 24).unwrap());
                assert_eq!(intent.time_of_day, NaiveTime::from_hms_opt(9, 0, 0));
            }
            other => panic!("expected resolved intent, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_interval_is_rejected() {
        let mut intent = parsed();
        intent.address = Some("0x0000000000000000000000000000000000000001".to_string());
        intent.interval = Some("fortnightly".to_string());

        let err = canonicalize(intent, None, today()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
