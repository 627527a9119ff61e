// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client error taxonomy.
//!
//! Every call that reaches the remote journal API resolves to either a value
//! or one of these errors. None of them is fatal: callers surface the error
//! and keep their state as it was.

use reqwest::StatusCode;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// No credential, an invalid one, or one that could not be refreshed.
    /// The token store has already been cleared when this is returned from
    /// the authenticated pipeline.
    #[error("authentication required")]
    Unauthorized,

    /// The server rejected the payload shape or content.
    #[error("request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// Transport failure before any HTTP status was received.
    #[error("network error: {0}")]
    Network(String),

    /// Any other non-success status.
    #[error("request failed ({status}): {message}")]
    ConflictOrUnknown { status: u16, message: String },

    /// A success status whose body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The operation needs a server-side entry and the draft has none yet.
    #[error("entry has not been saved yet")]
    NotSaved,
}

impl ClientError {
    /// Map a non-success HTTP status and its raw body to an error.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = server_message(body);
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation {
                status: status.as_u16(),
                message,
            },
            _ => ClientError::ConflictOrUnknown {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Unauthorized => "unauthorized",
            ClientError::Validation { .. } => "validation_error",
            ClientError::Network(_) => "network_error",
            ClientError::ConflictOrUnknown { .. } => "conflict_or_unknown",
            ClientError::InvalidResponse(_) => "invalid_response",
            ClientError::NotSaved => "not_saved",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

/// Pull a human-readable message out of an error body.
///
/// DRF answers with `{"detail": "..."}` for most failures and with a map of
/// field -> messages for validation errors; anything else is passed through.
fn server_message(body: &str) -> String {
    let trimmed = body.trim();
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return trimmed.to_string();
    };

    for key in ["detail", "error", "non_field_errors"] {
        match value.get(key) {
            Some(Value::String(msg)) => return msg.clone(),
            Some(Value::Array(items)) => {
                if let Some(Value::String(msg)) = items.first() {
                    return msg.clone();
                }
            }
            _ => {}
        }
    }

    trimmed.to_string()
}
