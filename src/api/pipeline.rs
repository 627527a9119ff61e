// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated request pipeline.
//!
//! ## Refresh Protocol
//!
//! 1. Attach the stored access token (if any) as a bearer credential.
//! 2. Issue the request.
//! 3. On a 401 for the first attempt of a logical request, refresh the
//!    access token once and re-issue the request with the new credential.
//! 4. On a 401 for the retried attempt, give up with `Unauthorized`.
//!
//! A refresh failure of any kind clears the token store. The retry bound is
//! carried by an [`AuthAttempt`] value, never by mutating the request.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::transport::{ApiRequest, ApiResponse, Transport};
use super::REFRESH_PATH;
use crate::error::ClientError;
use crate::models::RefreshedAccess;
use crate::storage::TokenStore;

/// Per-logical-request retry marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthAttempt {
    pub request_id: Uuid,
    pub retried: bool,
}

impl AuthAttempt {
    pub fn first() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            retried: false,
        }
    }

    /// The attempt that follows a successful refresh.
    pub fn into_retry(self) -> Self {
        Self {
            retried: true,
            ..self
        }
    }
}

/// Wraps every outbound call to the journal API.
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenStore>,
    /// Serializes refreshes so concurrent 401s share one refresh call.
    refresh_lock: Mutex<()>,
}

impl RequestPipeline {
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<TokenStore>) -> Self {
        Self {
            transport,
            tokens,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Send an authenticated request, refreshing the access token at most
    /// once if the server answers 401.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let mut attempt = AuthAttempt::first();
        loop {
            let presented = self.tokens.get().access_token;
            let response = self
                .transport
                .execute(request.authorized(presented.as_deref()))
                .await?;

            if response.status != StatusCode::UNAUTHORIZED {
                return response.error_for_status();
            }

            if attempt.retried {
                warn!(
                    request_id = %attempt.request_id,
                    request = %request.describe(),
                    "Retried request still unauthorized, clearing session"
                );
                self.tokens.clear();
                return Err(ClientError::Unauthorized);
            }

            debug!(
                request_id = %attempt.request_id,
                request = %request.describe(),
                "Unauthorized, attempting token refresh"
            );
            self.refresh_after_rejection(presented.as_deref()).await?;
            attempt = attempt.into_retry();
        }
    }

    /// Send a request that needs no credential (login, registration).
    ///
    /// No bearer is attached and a 401 never triggers a refresh or touches
    /// the stored tokens.
    pub async fn send_public(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let response = self.transport.execute(request.authorized(None)).await?;
        response.error_for_status()
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// On any failure the token store is cleared and `Unauthorized` returned.
    pub async fn refresh_access_token(&self) -> Result<(), ClientError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_after_rejection(&self, rejected: Option<&str>) -> Result<(), ClientError> {
        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while this one was in flight
        let current = self.tokens.get().access_token;
        if current.is_some() && current.as_deref() != rejected {
            debug!("Access token already replaced, retrying without refresh");
            return Ok(());
        }

        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<(), ClientError> {
        let Some(refresh) = self.tokens.get().refresh_token else {
            warn!("No refresh token available, clearing session");
            self.tokens.clear();
            return Err(ClientError::Unauthorized);
        };

        let outcome = match ApiRequest::post(REFRESH_PATH, &json!({ "refresh": refresh })) {
            Ok(request) => match self.transport.execute(request).await {
                Ok(response) => response
                    .error_for_status()
                    .and_then(|r| r.json::<RefreshedAccess>()),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(fresh) => {
                self.tokens.set(fresh.into());
                info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                self.tokens.clear();
                Err(ClientError::Unauthorized)
            }
        }
    }
}
