use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use walletgate_db::ConsumeError;

/// Authentication failure taxonomy. The first three are client errors
/// surfaced as 422 with field errors; `Infrastructure` is a 5xx and is
/// the only kind that gets logged with its cause.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error("challenge rejected: {0}")]
    ChallengeInvalid(ConsumeError),
    #[error("the signature could not be verified")]
    SignatureMismatch,
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl From<ConsumeError> for AuthError {
    fn from(e: ConsumeError) -> Self {
        match e {
            ConsumeError::Storage(err) => AuthError::Infrastructure(err),
            other => AuthError::ChallengeInvalid(other),
        }
    }
}

impl AuthError {
    /// Which request field failed and the message shown to the client.
    fn field_error(&self) -> (&str, String) {
        match self {
            AuthError::InvalidInput { field, reason } => (field, reason.clone()),
            AuthError::ChallengeInvalid(e) => ("nonce", format!("The challenge is invalid: {}.", e)),
            AuthError::SignatureMismatch => {
                ("signature", "The signature could not be verified.".to_string())
            }
            AuthError::Infrastructure(_) => ("server", "Internal server error.".to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::Infrastructure(e) => {
                error!("auth infrastructure error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error." })),
                )
                    .into_response()
            }
            _ => {
                let (field, message) = self.field_error();
                let mut errors = serde_json::Map::new();
                errors.insert(field.to_string(), json!([message]));
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "errors": errors })),
                )
                    .into_response()
            }
        }
    }
}
