// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gate for views that require a logged-in user.
//!
//! ## States
//!
//! ```text
//! Unknown ──► Unauthenticated            (no access token)
//!         ──► Authenticated              (token decodes, now < exp)
//!         ──► Checking ──► Authenticated (refresh succeeded)
//!                      ──► Unauthenticated
//! ```
//!
//! A token that does not decode goes through `Checking` like an expired one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::RequestPipeline;
use crate::auth::is_unexpired;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unknown,
    Checking,
    Authenticated,
    Unauthenticated,
}

/// What the caller should do with the protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Render,
    Wait,
    Redirect,
}

impl From<GuardState> for Decision {
    fn from(state: GuardState) -> Self {
        match state {
            GuardState::Unknown | GuardState::Checking => Decision::Wait,
            GuardState::Authenticated => Decision::Render,
            GuardState::Unauthenticated => Decision::Redirect,
        }
    }
}

pub struct SessionGuard {
    pipeline: Arc<RequestPipeline>,
    state: watch::Sender<GuardState>,
}

impl SessionGuard {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        let (state, _) = watch::channel(GuardState::Unknown);
        Self { pipeline, state }
    }

    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    /// Decision for the current state without running a check.
    ///
    /// `Wait` until [`SessionGuard::evaluate`] has settled.
    pub fn decision(&self) -> Decision {
        self.state().into()
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    /// Run the check against the stored session.
    pub async fn evaluate(&self) -> Decision {
        self.evaluate_at(Utc::now()).await
    }

    /// Same as [`SessionGuard::evaluate`] with an explicit clock.
    ///
    /// Cancel safe: dropping the call mid-refresh puts the state back to
    /// `Unknown` and anyone waiting on it runs the check again.
    pub async fn evaluate_at(&self, now: DateTime<Utc>) -> Decision {
        loop {
            let Some(access) = self.pipeline.tokens().get().access_token else {
                debug!("Session guard: no access token");
                return self.settle(GuardState::Unauthenticated);
            };

            if is_unexpired(&access, now) {
                return self.settle(GuardState::Authenticated);
            }

            // Only one caller drives the refresh; the rest wait for its outcome
            let Some(claim) = CheckClaim::acquire(&self.state) else {
                let mut rx = self.state.subscribe();
                match rx.wait_for(|state| *state != GuardState::Checking).await {
                    Ok(state) if *state != GuardState::Unknown => return (*state).into(),
                    Ok(_) => {
                        debug!("Session guard: previous check abandoned, retrying");
                        continue;
                    }
                    Err(_) => return Decision::Redirect,
                };
            };

            debug!("Session guard: access token expired or unreadable, refreshing");
            let next = match self.pipeline.refresh_access_token().await {
                Ok(()) => {
                    info!("Session guard: session restored by refresh");
                    GuardState::Authenticated
                }
                Err(e) => {
                    warn!(error = %e, "Session guard: refresh failed, redirecting to login");
                    GuardState::Unauthenticated
                }
            };
            return claim.settle(next);
        }
    }

    fn settle(&self, next: GuardState) -> Decision {
        self.state.send_replace(next);
        next.into()
    }
}

/// Ownership of the `Checking` state. Reverts to `Unknown` if dropped
/// before [`CheckClaim::settle`].
struct CheckClaim<'a> {
    state: &'a watch::Sender<GuardState>,
    settled: bool,
}

impl<'a> CheckClaim<'a> {
    fn acquire(state: &'a watch::Sender<GuardState>) -> Option<Self> {
        let claimed = state.send_if_modified(|current| {
            if *current == GuardState::Checking {
                return false;
            }
            *current = GuardState::Checking;
            true
        });
        claimed.then_some(Self {
            state,
            settled: false,
        })
    }

    fn settle(mut self, next: GuardState) -> Decision {
        self.settled = true;
        self.state.send_replace(next);
        next.into()
    }
}

impl Drop for CheckClaim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.state.send_if_modified(|current| {
                if *current != GuardState::Checking {
                    return false;
                }
                *current = GuardState::Unknown;
                true
            });
        }
    }
}
