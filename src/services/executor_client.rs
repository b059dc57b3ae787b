use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::prelude::Decimal;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::crypto::{ WorkerAuth, AUTH_HEADER, TIMESTAMP_HEADER };
use crate::error::{ AppError, Result };

/// Body of a signed dispatch request to the executor bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPayload {
    pub schedule_id: Uuid,
    pub user_address: String,
    pub recipient: String,
    pub amount: Decimal,
    pub token: String,
    pub timestamp: i64,
}

/// Executor bridge response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Dispatcher-side client for the privileged execution endpoint. Signs the
/// literal body bytes it sends; the call is bounded by the dispatch timeout
/// and a timeout is treated as a failed fire by the caller.
pub struct ExecutorClient {
    client: reqwest::Client,
    url: String,
    auth: Arc<WorkerAuth>,
}

impl ExecutorClient {
    pub fn new(url: String, auth: Arc<WorkerAuth>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client
            ::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build executor client: {}", e)))?;

        Ok(Self { client, url, auth })
    }

    pub async fn dispatch(&self, payload: &DispatchPayload) -> Result<ExecutorResponse> {
        let body = serde_json
            ::to_vec(payload)
            .map_err(|e| AppError::Internal(format!("failed to encode dispatch payload: {}", e)))?;

        let timestamp_ms = Utc::now().timestamp_millis();
        let signature = self.auth.sign(timestamp_ms, &body)?;

        let response = self.client
            .post(&self.url)
            .header("content-type", "application/json")
            .header(AUTH_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp_ms.to_string())
            .body(body)
            .send().await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout("executor call timed out".to_string())
                } else {
                    AppError::RpcUnavailable(format!("executor unreachable: {}", e))
                }
            })?;

        let status = response.status();
        let parsed = response.json::<ExecutorResponse>().await;

        match parsed {
            Ok(envelope) => Ok(envelope),
            Err(_) =>
                Ok(ExecutorResponse {
                    ok: false,
                    tx_hash: None,
                    error: Some(format!("executor returned {}", status)),
                    code: Some("internal".to_string()),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_uses_wire_field_names() {
        let payload = DispatchPayload {
            schedule_id: Uuid::nil(),
            user_address: "0xuser".to_string(),
            recipient: "0xto".to_string(),
            amount: Decimal::from(5),
            token: "0xusdc".to_string(),
            timestamp: 1_700_000_000_000,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("scheduleId").is_some());
        assert!(json.get("userAddress").is_some());
        assert!(json.get("token").is_some());
        assert!(json.get("schedule_id").is_none());
    }

    #[test]
    fn test_signature_covers_encoded_body() {
        let auth = WorkerAuth::new(b"0123456789abcdef0123456789abcdef", 300);
        let payload = DispatchPayload {
            schedule_id: Uuid::nil(),
            user_address: "0xuser".to_string(),
            recipient: "0xto".to_string(),
            amount: Decimal::from(5),
            token: "0xusdc".to_string(),
            timestamp: 1_700_000_000_000,
        };

        let body = serde_json::to_vec(&payload).unwrap();
        let signature = auth.sign(42, &body).unwrap();

        auth.verify(42, &body, &signature, 42).unwrap();

        // One flipped byte in transport invalidates the envelope.
        let mut tampered = body.clone();
        tampered[0] ^= 1;
        assert!(auth.verify(42, &tampered, &signature, 42).is_err());
    }
}
