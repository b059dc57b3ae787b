use std::sync::Arc;

use sea_orm::prelude::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::entity::transaction;
use crate::db::{ NewTransaction, ShardManager };
use crate::enums::{ TxKind, TxStatus };
use crate::error::{ AppError, Result };
use crate::services::recipient_service::validate_wallet;

/// Client-reported transaction to record, e.g. a one-shot send executed in
/// the user's own wallet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTransactionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: Option<String>,
    pub address: String,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub status: String,
    pub tx_hash: Option<String>,
    pub schedule_id: Option<Uuid>,
    pub note: Option<String>,
}

fn default_currency() -> String {
    "USDC".to_string()
}

pub struct TransactionService {
    shards: Arc<ShardManager>,
}

impl TransactionService {
    pub fn new(shards: Arc<ShardManager>) -> Self {
        Self { shards }
    }

    /// Transaction history, newest first.
    pub async fn list(&self, user_address: &str) -> Result<Vec<transaction::Model>> {
        self.shards.shard(user_address).await.list_transactions().await
    }

    /// Record a caller-reported transaction. History is append-only; there
    /// is no update path.
    pub async fn store(
        &self,
        user_address: &str,
        request: StoreTransactionRequest
    ) -> Result<transaction::Model> {
        let kind: TxKind = request.kind.parse()?;
        let status: TxStatus = request.status.parse()?;

        validate_wallet(&request.address)?;
        if request.amount <= Decimal::ZERO {
            return Err(AppError::Validation("amount must be positive".to_string()));
        }

        self.shards.shard(user_address).await.append_transaction(NewTransaction {
            kind,
            name: request.name,
            address: request.address,
            amount: request.amount,
            currency: request.currency,
            status,
            tx_hash: request.tx_hash,
            schedule_id: request.schedule_id,
            note: request.note,
        }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_request_parses_spec_field_names() {
        let request: StoreTransactionRequest = serde_json
            ::from_str(
                r#"{
                    "type": "send_once",
                    "address": "0x0000000000000000000000000000000000000001",
                    "amount": "12.5",
                    "status": "completed",
                    "txHash": "0xabc",
                    "note": "coffee"
                }"#
            )
            .unwrap();

        assert_eq!(request.kind, "send_once");
        assert_eq!(request.currency, "USDC");
        assert_eq!(request.tx_hash.as_deref(), Some("0xabc"));
        assert_eq!(request.schedule_id, None);
    }
}
