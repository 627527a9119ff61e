// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token claims.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Claims carried by the access tokens the journal API issues.
///
/// Only `exp` matters to the client; the rest is kept for logging.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// Expiration timestamp (seconds since the Unix epoch)
    #[serde(default)]
    pub exp: Option<i64>,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: Option<i64>,

    /// Server-side user id
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Token type marker (`access` | `refresh`)
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimsError {
    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token has no usable exp claim")]
    MissingExpiry,
}

/// Decode the claims of `token` without verifying its signature.
pub fn decode_claims(token: &str) -> Result<AccessClaims, ClaimsError> {
    jsonwebtoken::dangerous::insecure_decode::<AccessClaims>(token)
        .map(|data| data.claims)
        .map_err(|e| ClaimsError::Malformed(e.to_string()))
}

/// Expiry instant encoded in `token`.
pub fn access_token_expiry(token: &str) -> Result<DateTime<Utc>, ClaimsError> {
    let exp = decode_claims(token)?.exp.ok_or(ClaimsError::MissingExpiry)?;
    DateTime::from_timestamp(exp, 0).ok_or(ClaimsError::MissingExpiry)
}

/// `true` only when `token` decodes and `now` is strictly before its expiry.
///
/// A token that cannot be decoded is treated exactly like an expired one.
pub fn is_unexpired(token: &str, now: DateTime<Utc>) -> bool {
    match access_token_expiry(token) {
        Ok(expires_at) => now < expires_at,
        Err(_) => false,
    }
}
