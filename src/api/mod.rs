use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub mod auth;
pub mod intent;
pub mod process;
pub mod recipients;
pub mod transactions;

use crate::config::Config;
use crate::crypto::WorkerAuth;
use crate::executor::ExecutorBridge;
use crate::error::AppError;
use crate::services::{
    AuthService,
    IntentService,
    RecipientService,
    ScheduleService,
    TransactionService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: Arc<AuthService>,
    pub recipient_service: Arc<RecipientService>,
    pub schedule_service: Arc<ScheduleService>,
    pub transaction_service: Arc<TransactionService>,
    pub intent_service: Arc<IntentService>,
    pub bridge: Arc<ExecutorBridge>,
    pub worker_auth: Arc<WorkerAuth>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        auth_service: Arc<AuthService>,
        recipient_service: Arc<RecipientService>,
        schedule_service: Arc<ScheduleService>,
        transaction_service: Arc<TransactionService>,
        intent_service: Arc<IntentService>,
        bridge: Arc<ExecutorBridge>,
        worker_auth: Arc<WorkerAuth>
    ) -> Self {
        Self {
            config,
            auth_service,
            recipient_service,
            schedule_service,
            transaction_service,
            intent_service,
            bridge,
            worker_auth,
        }
    }
}

/// The caller's wallet address, proven by the bearer token from the
/// signature-verify flow.
pub struct AuthedUser(pub String);

impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = parts.headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let address = state.auth_service.verify_token(token)?;
        Ok(AuthedUser(address))
    }
}
