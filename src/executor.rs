use std::sync::Arc;

use sea_orm::prelude::Decimal;

use crate::chain::ChainClient;
use crate::error::{ AppError, Result };
use crate::services::executor_client::DispatchPayload;
use crate::services::recipient_service::validate_wallet;

/// The privileged execution half of the pipeline: takes an authenticated
/// dispatch payload and performs the on-chain pull. The dispatcher owns all
/// shard bookkeeping for fires; the bridge only talks to the chain.
pub struct ExecutorBridge {
    chain: Arc<ChainClient>,
}

impl ExecutorBridge {
    pub fn new(chain: Arc<ChainClient>) -> Self {
        Self { chain }
    }

    /// Execute one pull payment and return its transaction hash. The chain
    /// call runs in its own task: once a transaction may have been
    /// submitted, cancellation of the request must not abandon it
    /// mid-flight.
    pub async fn process(&self, payload: DispatchPayload) -> Result<String> {
        validate_payload(&payload)?;

        let chain = self.chain.clone();
        let handle = tokio::spawn(async move {
            chain.pull_payment(
                &payload.token,
                &payload.user_address,
                &payload.recipient,
                payload.amount,
                payload.schedule_id
            ).await
        });

        handle.await.map_err(|e| AppError::Internal(format!("execution task failed: {}", e)))?
    }
}

fn validate_payload(payload: &DispatchPayload) -> Result<()> {
    validate_wallet(&payload.user_address)?;
    validate_wallet(&payload.recipient)?;
    validate_wallet(&payload.token)?;

    if payload.amount <= Decimal::ZERO {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }
    if payload.timestamp <= 0 {
        return Err(AppError::Validation("timestamp is required".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn payload() -> DispatchPayload {
        DispatchPayload {
            schedule_id: Uuid::new_v4(),
            user_address: "0x0000000000000000000000000000000000000001".to_string(),
            recipient: "0x0000000000000000000000000000000000000002".to_string(),
            amount: Decimal::from(5),
            token: "0x0000000000000000000000000000000000000003".to_string(),
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_well_formed_payload_passes() {
        validate_payload(&payload()).unwrap();
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut bad = payload();
        bad.amount = Decimal::ZERO;
        assert!(matches!(validate_payload(&bad), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_malformed_addresses_rejected() {
        let mut bad = payload();
        bad.recipient = "not-an-address".to_string();
        assert!(matches!(validate_payload(&bad), Err(AppError::Validation(_))));

        let mut bad = payload();
        bad.token = "".to_string();
        assert!(matches!(validate_payload(&bad), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_missing_timestamp_rejected() {
        let mut bad = payload();
        bad.timestamp = 0;
        assert!(matches!(validate_payload(&bad), Err(AppError::Validation(_))));
    }
}
