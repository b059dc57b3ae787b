use axum::{ extract::State, Json };
use serde::{ Deserialize, Serialize };

use crate::db::entity::recipient;
use crate::error::Result;
use crate::services::{ CanonicalIntent, IntentOutcome };

use super::{ AppState, AuthedUser };

#[derive(Deserialize)]
pub struct ParseIntentRequest {
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseIntentResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_intent: Option<CanonicalIntent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<recipient::Model>>,
}

pub async fn parse_intent(
    State(state): State<AppState>,
    AuthedUser(address): AuthedUser,
    Json(request): Json<ParseIntentRequest>
) -> Result<Json<ParseIntentResponse>> {
    let outcome = state.intent_service.resolve(&address, &request.text).await?;

    let response = match outcome {
        IntentOutcome::Resolved(intent) =>
            ParseIntentResponse {
                status: "ok".to_string(),
                parsed_intent: Some(intent),
                name: None,
                options: None,
            },
        IntentOutcome::AmbiguousRecipient { name, options } =>
            ParseIntentResponse {
                status: "ambiguous_recipient".to_string(),
                parsed_intent: None,
                name: Some(name),
                options: Some(options),
            },
        IntentOutcome::RecipientMissing { name } =>
            ParseIntentResponse {
                status: "recipient_missing".to_string(),
                parsed_intent: None,
                name: Some(name),
                options: None,
            },
    };

    Ok(Json(response))
}
