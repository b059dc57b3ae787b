use axum::body::Bytes;
use axum::extract::State;
use axum::http::{ HeaderMap, StatusCode };
use axum::response::{ IntoResponse, Response };
use axum::Json;
use chrono::Utc;

use crate::crypto::{ AUTH_HEADER, TIMESTAMP_HEADER };
use crate::error::AppError;
use crate::services::executor_client::{ DispatchPayload, ExecutorResponse };

use super::AppState;

/// Privileged dispatch endpoint. The HMAC must cover the literal body
/// bytes, so the body is taken raw and only parsed after the envelope
/// checks out.
pub async fn process_recurring(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes
) -> Response {
    if let Err(e) = verify_envelope(&state, &headers, &body) {
        return reject(e);
    }

    let payload: DispatchPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            return reject(AppError::Validation(format!("malformed dispatch payload: {}", e)));
        }
    };

    let schedule_id = payload.schedule_id;
    match state.bridge.process(payload).await {
        Ok(tx_hash) => {
            tracing::info!(schedule_id = %schedule_id, tx_hash = %tx_hash, "pull payment confirmed");
            (
                StatusCode::OK,
                Json(ExecutorResponse {
                    ok: true,
                    tx_hash: Some(tx_hash),
                    error: None,
                    code: None,
                }),
            ).into_response()
        }
        Err(e) => {
            tracing::warn!(schedule_id = %schedule_id, "pull payment failed: {}", e);
            reject(e)
        }
    }
}

fn verify_envelope(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8]
) -> Result<(), AppError> {
    let signature = headers
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Forbidden("missing worker auth header".to_string()))?;

    let timestamp_ms: i64 = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| AppError::Forbidden("missing or malformed worker timestamp".to_string()))?;

    state.worker_auth.verify(timestamp_ms, body, signature, Utc::now().timestamp_millis())
}

/// Failure envelope in the executor wire shape, with the status the error
/// kind maps to.
fn reject(error: AppError) -> Response {
    let status = match &error {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::ChainRevert(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::RpcUnavailable(_) => StatusCode::BAD_GATEWAY,
        AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let envelope = ExecutorResponse {
        ok: false,
        tx_hash: None,
        error: Some(error.to_string()),
        code: Some(error.code().to_string()),
    };

    (status, Json(envelope)).into_response()
}
