use axum::{ extract::State, Json };
use chrono::NaiveDate;
use sea_orm::prelude::Decimal;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::db::entity::{ schedule, transaction };
use crate::enums::Interval;
use crate::error::Result;
use crate::services::intent_service::parse_time;
use crate::services::{ CreateScheduleRequest, StoreTransactionRequest };

use super::{ AppState, AuthedUser };

#[derive(Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<transaction::Model>,
}

#[derive(Serialize)]
pub struct StoreTransactionResponse {
    pub success: bool,
    pub stored: transaction::Model,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRecurringRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub recipient: String,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub interval: String,
    #[serde(default)]
    pub interval_ms: Option<i64>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub times: Option<i32>,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_currency() -> String {
    "USDC".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRecurringResponse {
    pub ok: bool,
    pub schedule: schedule::Model,
    pub contract_address: String,
}

#[derive(Serialize)]
pub struct ScheduleListResponse {
    pub schedules: Vec<schedule::Model>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelScheduleRequest {
    pub schedule_id: Uuid,
}

#[derive(Serialize)]
pub struct CancelScheduleResponse {
    pub success: bool,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    AuthedUser(address): AuthedUser
) -> Result<Json<TransactionListResponse>> {
    let transactions = state.transaction_service.list(&address).await?;

    Ok(Json(TransactionListResponse { transactions }))
}

pub async fn store_transaction(
    State(state): State<AppState>,
    AuthedUser(address): AuthedUser,
    Json(request): Json<StoreTransactionRequest>
) -> Result<Json<StoreTransactionResponse>> {
    let stored = state.transaction_service.store(&address, request).await?;

    Ok(
        Json(StoreTransactionResponse {
            success: true,
            stored,
        })
    )
}

pub async fn setup_recurring(
    State(state): State<AppState>,
    AuthedUser(address): AuthedUser,
    Json(request): Json<SetupRecurringRequest>
) -> Result<Json<SetupRecurringResponse>> {
    let interval: Interval = request.interval.parse()?;
    let time_of_day = request.time_of_day.as_deref().map(parse_time).transpose()?;

    let schedule = state.schedule_service.create(&address, CreateScheduleRequest {
        name: request.name,
        recipient: request.recipient,
        amount: request.amount,
        currency: request.currency,
        interval,
        interval_ms: request.interval_ms,
        start_date: request.start_date,
        time_of_day,
        times: request.times,
        note: request.note,
    }).await?;

    Ok(
        Json(SetupRecurringResponse {
            ok: true,
            schedule,
            contract_address: state.config.recurring_contract.clone(),
        })
    )
}

pub async fn list_schedules(
    State(state): State<AppState>,
    AuthedUser(address): AuthedUser
) -> Result<Json<ScheduleListResponse>> {
    let schedules = state.schedule_service.list(&address).await?;

    Ok(Json(ScheduleListResponse { schedules }))
}

pub async fn cancel_schedule(
    State(state): State<AppState>,
    AuthedUser(address): AuthedUser,
    Json(request): Json<CancelScheduleRequest>
) -> Result<Json<CancelScheduleResponse>> {
    state.schedule_service.cancel(&address, request.schedule_id).await?;

    Ok(Json(CancelScheduleResponse { success: true }))
}
