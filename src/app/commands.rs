// ==========================================
// Asset inventory - command responses
// ==========================================
// Every session operation answers with a CommandResponse; errors become
// { status: false, code, message } instead of propagating.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use serde::Serialize;

/// Structured result handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    pub status: bool,
    pub message: String,
    /// Stable error code, absent on success
    pub code: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// Stable code per error kind
pub fn error_code(err: &ApiError) -> &'static str {
    match err {
        ApiError::NoActiveCycle => "NO_ACTIVE_CYCLE",
        ApiError::InvalidInput(_) => "INVALID_INPUT",
        ApiError::NotFound(_) => "NOT_FOUND",
        ApiError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
        ApiError::DatabaseError(_) => "DATABASE_ERROR",
        ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
        ApiError::ImportError(_) => "IMPORT_ERROR",
        ApiError::ValidationError(_) => "VALIDATION_ERROR",
        ApiError::InternalError(_) => "INTERNAL_ERROR",
        ApiError::Other(_) => "OTHER_ERROR",
    }
}

impl CommandResponse {
    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
            code: None,
            data: None,
        }
    }

    pub fn ok<T: Serialize>(message: impl Into<String>, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                status: true,
                message: message.into(),
                code: None,
                data: Some(value),
            },
            Err(e) => Self::from_error(ApiError::InternalError(format!(
                "response serialization failed: {}",
                e
            ))),
        }
    }

    pub fn from_error(err: ApiError) -> Self {
        tracing::warn!(code = error_code(&err), error = %err, "command failed");
        Self {
            status: false,
            code: Some(error_code(&err).to_string()),
            message: err.to_string(),
            data: None,
        }
    }

    /// Ok -> data + message built from it; Err -> error response
    pub fn from_result<T: Serialize>(result: ApiResult<T>, message: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(data) => {
                let msg = message(&data);
                Self::ok(msg, &data)
            }
            Err(err) => Self::from_error(err),
        }
    }
}
