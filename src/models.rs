// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Wire types exchanged with the journal API plus the client-side
//! [`Session`] value held by the token store.
//!
//! ## Model Categories
//!
//! - **Session**: access/refresh token pair (durable, client-side)
//! - **Auth exchange**: login, registration and refresh payloads
//! - **Journals**: entries, write payloads and mood/insight annotations

use serde::{Deserialize, Serialize};

// =============================================================================
// Session
// =============================================================================

/// Credentials held by the client.
///
/// Both fields absent means "logged out".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    pub fn is_logged_out(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Partial update applied by [`crate::storage::TokenStore::set`].
///
/// `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl SessionPatch {
    /// Replace only the access token (refresh path).
    pub fn access(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            refresh_token: None,
        }
    }

    /// Replace both tokens (login path).
    pub fn pair(pair: TokenPair) -> Self {
        Self {
            access_token: Some(pair.access),
            refresh_token: Some(pair.refresh),
        }
    }

    pub(crate) fn apply_to(&self, session: &mut Session) {
        if let Some(access) = &self.access_token {
            session.access_token = Some(access.clone());
        }
        if let Some(refresh) = &self.refresh_token {
            session.refresh_token = Some(refresh.clone());
        }
    }
}

// =============================================================================
// Auth Exchange
// =============================================================================

/// `POST /token/` request body.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// `POST /users/` request body.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `POST /token/` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// `POST /token/refresh/` response.
///
/// `refresh` is only present when the server rotates refresh tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedAccess {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl From<RefreshedAccess> for SessionPatch {
    fn from(value: RefreshedAccess) -> Self {
        Self {
            access_token: Some(value.access),
            refresh_token: value.refresh,
        }
    }
}

/// `GET /users/me/` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

// =============================================================================
// Journals
// =============================================================================

/// Server-assigned journal entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntryId {
    fn from(value: i64) -> Self {
        EntryId(value)
    }
}

/// Per-entry emotion breakdown produced by the remote analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodStats {
    #[serde(default)]
    pub percent_happiness: i32,
    #[serde(default)]
    pub percent_fear: i32,
    #[serde(default)]
    pub percent_sadness: i32,
    #[serde(default)]
    pub percent_surprise: i32,
    #[serde(default)]
    pub percent_disgust: i32,
    #[serde(default)]
    pub percent_anger: i32,
    #[serde(default)]
    pub dominant_mood: String,
}

/// Advice text produced by the remote analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(default)]
    pub id: Option<i64>,
    pub insight_content: String,
}

/// A journal entry as returned by `/journals/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: EntryId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub user: Option<i64>,
    #[serde(default)]
    pub mood_stats: Option<MoodStats>,
    #[serde(default)]
    pub insights: Option<Insight>,
}

impl JournalEntry {
    pub fn dominant_mood(&self) -> Option<&str> {
        self.mood_stats
            .as_ref()
            .map(|stats| stats.dominant_mood.as_str())
            .filter(|mood| !mood.is_empty())
    }
}

/// Body of `POST /journals/` and `PUT /journals/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalPayload {
    pub title: String,
    pub date: String,
    pub content: String,
}

/// `POST /journals/{id}/process_emotions/` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionAnalysis {
    pub mood_stats: MoodStats,
    #[serde(default)]
    pub insights: Option<Insight>,
}
