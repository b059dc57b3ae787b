use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")] Database(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")] Validation(String),

    #[error("Not found: {0}")] NotFound(String),

    #[error("Duplicate: {0}")] Duplicate(String),

    #[error("Ambiguous recipient: {0}")] AmbiguousRecipient(String),

    #[error("Recipient missing: {0}")] RecipientMissing(String),

    #[error("Unauthorized: {0}")] Unauthorized(String),

    #[error("Forbidden: {0}")] Forbidden(String),

    #[error("Timed out: {0}")] Timeout(String),

    #[error("Chain revert: {0}")] ChainRevert(String),

    #[error("RPC unavailable: {0}")] RpcUnavailable(String),

    #[error("Parser error: {0}")] Parser(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Internal error: {0}")] Internal(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "internal",
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Duplicate(_) => "duplicate",
            AppError::AmbiguousRecipient(_) => "ambiguous_recipient",
            AppError::RecipientMissing(_) => "recipient_missing",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Timeout(_) => "timeout",
            AppError::ChainRevert(_) => "chain_revert",
            AppError::RpcUnavailable(_) => "rpc_unavailable",
            AppError::Parser(_) => "internal",
            AppError::Config(_) => "internal",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let message = match self {
            // Never leak raw database errors to clients.
            AppError::Database(_) => "internal storage error".to_string(),
            other => other.to_string(),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                field: None,
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Validation(_)
            | AppError::AmbiguousRecipient(_)
            | AppError::RecipientMissing(_) => axum::http::StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
            AppError::Duplicate(_) => axum::http::StatusCode::CONFLICT,
            AppError::Unauthorized(_) => axum::http::StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => axum::http::StatusCode::FORBIDDEN,
            AppError::Timeout(_) => axum::http::StatusCode::GATEWAY_TIMEOUT,
            AppError::ChainRevert(_) => axum::http::StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RpcUnavailable(_) => axum::http::StatusCode::BAD_GATEWAY,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
