// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Layer
//!
//! Consumers of the token store that sit above the request pipeline:
//!
//! - [`SessionGuard`] decides whether a protected view may render.
//! - [`SessionDataCache`] holds the profile and journal index for the
//!   current session and drops them when the session changes hands.

pub mod cache;
pub mod guard;

pub use cache::SessionDataCache;
pub use guard::{Decision, GuardState, SessionGuard};
