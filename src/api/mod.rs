// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Journal API Client
//!
//! Typed access to the remote journal service. Every call funnels through
//! the [`RequestPipeline`], which owns bearer attachment and the one-shot
//! refresh protocol.
//!
//! ## Endpoints
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | `POST` | `/token/` | none |
//! | `POST` | `/token/refresh/` | none (pipeline only) |
//! | `POST` | `/users/` | none |
//! | `GET` | `/users/me/` | bearer |
//! | `DELETE` | `/users/{id}/` | bearer |
//! | `GET` | `/journals/` | bearer |
//! | `GET/PUT/DELETE` | `/journals/{id}/` | bearer |
//! | `POST` | `/journals/` | bearer |
//! | `POST` | `/journals/{id}/process_emotions/` | bearer |

pub mod account;
pub mod journals;
pub mod pipeline;
pub mod transport;
pub mod users;

use std::sync::Arc;

pub use pipeline::{AuthAttempt, RequestPipeline};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportError};

use crate::storage::TokenStore;

pub const TOKEN_PATH: &str = "token/";
pub const REFRESH_PATH: &str = "token/refresh/";
pub const USERS_PATH: &str = "users/";
pub const ME_PATH: &str = "users/me/";
pub const JOURNALS_PATH: &str = "journals/";

pub fn journal_path(id: crate::models::EntryId) -> String {
    format!("{JOURNALS_PATH}{id}/")
}

pub fn user_path(id: i64) -> String {
    format!("{USERS_PATH}{id}/")
}

/// Typed client over the request pipeline.
///
/// Endpoint groups live in `account`, `users` and `journals`.
#[derive(Clone)]
pub struct ApiClient {
    pipeline: Arc<RequestPipeline>,
}

impl ApiClient {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        self.pipeline.tokens()
    }
}
