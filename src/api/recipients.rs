use axum::{ extract::State, Json };
use serde::{ Deserialize, Serialize };

use crate::db::entity::recipient;
use crate::db::RecipientPatch;
use crate::error::Result;

use super::{ AppState, AuthedUser };

#[derive(Serialize)]
pub struct RecipientListResponse {
    pub recipients: Vec<recipient::Model>,
}

#[derive(Deserialize)]
pub struct AddRecipientRequest {
    pub name: String,
    pub wallet: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Serialize)]
pub struct AddRecipientResponse {
    pub success: bool,
    pub recipients: Vec<recipient::Model>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipientRequest {
    pub old_wallet: String,
    #[serde(default)]
    pub new_wallet: Option<String>,
    #[serde(default)]
    pub new_name: Option<String>,
    #[serde(default)]
    pub new_note: Option<String>,
}

#[derive(Serialize)]
pub struct UpdateRecipientResponse {
    pub success: bool,
    pub updated: recipient::Model,
}

#[derive(Deserialize)]
pub struct DeleteRecipientRequest {
    pub wallet: String,
}

#[derive(Serialize)]
pub struct DeleteRecipientResponse {
    pub success: bool,
}

pub async fn list_recipients(
    State(state): State<AppState>,
    AuthedUser(address): AuthedUser
) -> Result<Json<RecipientListResponse>> {
    let recipients = state.recipient_service.list(&address).await?;

    Ok(Json(RecipientListResponse { recipients }))
}

pub async fn add_recipient(
    State(state): State<AppState>,
    AuthedUser(address): AuthedUser,
    Json(request): Json<AddRecipientRequest>
) -> Result<Json<AddRecipientResponse>> {
    state.recipient_service.add(&address, request.name, request.wallet, request.note).await?;

    let recipients = state.recipient_service.list(&address).await?;
    Ok(
        Json(AddRecipientResponse {
            success: true,
            recipients,
        })
    )
}

pub async fn update_recipient(
    State(state): State<AppState>,
    AuthedUser(address): AuthedUser,
    Json(request): Json<UpdateRecipientRequest>
) -> Result<Json<UpdateRecipientResponse>> {
    let updated = state.recipient_service.update(&address, &request.old_wallet, RecipientPatch {
        wallet: request.new_wallet,
        name: request.new_name,
        note: request.new_note,
    }).await?;

    Ok(
        Json(UpdateRecipientResponse {
            success: true,
            updated,
        })
    )
}

pub async fn delete_recipient(
    State(state): State<AppState>,
    AuthedUser(address): AuthedUser,
    Json(request): Json<DeleteRecipientRequest>
) -> Result<Json<DeleteRecipientResponse>> {
    state.recipient_service.delete(&address, &request.wallet).await?;

    Ok(Json(DeleteRecipientResponse { success: true }))
}
