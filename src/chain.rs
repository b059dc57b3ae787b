use std::sync::Arc;

use ethers::{
    contract::Contract,
    middleware::SignerMiddleware,
    providers::{ Http, Provider },
    signers::{ LocalWallet, Signer },
    types::{ Address, U256 },
    utils::parse_units,
};
use sea_orm::prelude::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{ AppError, Result };

const USDC_DECIMALS: u32 = 6;

const PULL_PAYMENT_ABI: &str =
    "function pullPayment(address token, address from, address to, uint256 amount, bytes32 scheduleId) external";

/// Client for the recurring-payments contract, signing with the process-wide
/// executor key. Submissions are serialized so at most one transaction from
/// the executor key is pending at a time.
pub struct ChainClient {
    contract: Contract<SignerMiddleware<Provider<Http>, LocalWallet>>,
    submit_lock: Mutex<()>,
}

impl ChainClient {
    pub fn new(
        rpc_url: &str,
        chain_id: u64,
        executor_private_key: &str,
        contract_address: &str
    ) -> Result<Self> {
        let provider = Provider::<Http>
            ::try_from(rpc_url)
            .map_err(|e| AppError::Config(format!("invalid RPC url: {}", e)))?;

        let wallet: LocalWallet = executor_private_key
            .trim_start_matches("0x")
            .parse()
            .map_err(|_| AppError::Config("invalid executor private key".to_string()))?;

        let client = SignerMiddleware::new(provider, wallet.with_chain_id(chain_id));

        let abi = ethers::abi
            ::parse_abi(&[PULL_PAYMENT_ABI])
            .map_err(|e| AppError::Internal(format!("failed to parse ABI: {}", e)))?;

        let address: Address = contract_address
            .parse()
            .map_err(|_| AppError::Config("invalid recurring contract address".to_string()))?;

        Ok(Self {
            contract: Contract::new(address, abi, Arc::new(client)),
            submit_lock: Mutex::new(()),
        })
    }

    /// Pull `amount` of `token` from the payer to the recipient under their
    /// prior allowance, waiting for one confirmation. Returns the tx hash.
    pub async fn pull_payment(
        &self,
        token: &str,
        from: &str,
        to: &str,
        amount: Decimal,
        schedule_id: Uuid
    ) -> Result<String> {
        let token: Address = token
            .parse()
            .map_err(|_| AppError::Validation("invalid token address".to_string()))?;
        let from: Address = from
            .parse()
            .map_err(|_| AppError::Validation("invalid payer address".to_string()))?;
        let to: Address = to
            .parse()
            .map_err(|_| AppError::Validation("invalid recipient address".to_string()))?;

        let amount: U256 = parse_units(amount.to_string(), USDC_DECIMALS)
            .map_err(|e| AppError::Validation(format!("invalid amount: {}", e)))?
            .into();

        let correlation = schedule_id_bytes(schedule_id);

        // Chain nonce discipline: one pending transaction per executor key.
        let _guard = self.submit_lock.lock().await;

        let call = self.contract
            .method::<_, ()>("pullPayment", (token, from, to, amount, correlation))
            .map_err(|e| AppError::Internal(format!("failed to prepare pullPayment: {}", e)))?;

        let pending = call.send().await.map_err(|e| {
            let message = e.to_string();
            if message.contains("revert") {
                AppError::ChainRevert(message)
            } else {
                AppError::RpcUnavailable(format!("pullPayment submission failed: {}", message))
            }
        })?;

        let tx_hash = format!("{:?}", pending.tx_hash());

        let receipt = pending
            .confirmations(1).await
            .map_err(|e| AppError::RpcUnavailable(format!("confirmation wait failed: {}", e)))?;

        match receipt {
            Some(receipt) if receipt.status == Some(1u64.into()) => Ok(tx_hash),
            Some(_) => Err(AppError::ChainRevert(format!("transaction {} reverted", tx_hash))),
            None => Err(AppError::RpcUnavailable(format!("transaction {} was dropped", tx_hash))),
        }
    }
}

/// 32-byte correlation id for the contract: the schedule UUID's 16 bytes,
/// left-padded with zeros.
pub fn schedule_id_bytes(schedule_id: Uuid) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes[16..].copy_from_slice(schedule_id.as_bytes());
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_id_is_left_padded() {
        let id = Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap();
        let bytes = schedule_id_bytes(id);

        assert_eq!(&bytes[..16], &[0u8; 16]);
        assert_eq!(&bytes[16..], id.as_bytes());
    }

    #[test]
    fn test_nil_uuid_encodes_to_all_zeros() {
        assert_eq!(schedule_id_bytes(Uuid::nil()), [0u8; 32]);
    }
}
