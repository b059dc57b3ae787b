use axum::{ extract::State, Json };
use serde::{ Deserialize, Serialize };

use crate::error::Result;

use super::AppState;

#[derive(Deserialize)]
pub struct NonceRequest {
    pub address: String,
}

#[derive(Serialize)]
pub struct NonceResponse {
    pub nonce: String,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub address: String,
    pub signature: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub token: String,
    pub address: String,
}

pub async fn issue_nonce(
    State(state): State<AppState>,
    Json(request): Json<NonceRequest>
) -> Result<Json<NonceResponse>> {
    let nonce = state.auth_service.issue_nonce(&request.address).await?;

    Ok(Json(NonceResponse { nonce }))
}

pub async fn verify_signature(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>
) -> Result<Json<VerifyResponse>> {
    let token = state.auth_service.verify(&request.address, &request.signature).await?;

    Ok(
        Json(VerifyResponse {
            token,
            address: request.address.to_lowercase(),
        })
    )
}
