// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pahinga Client - Journal Session & Autosave Core
//!
//! Client-side session lifecycle and entry autosave for the Pahinga
//! journaling service.
//!
//! ## Modules
//!
//! - `storage` - Durable token store (redb)
//! - `api` - Request pipeline with one-shot token refresh, typed endpoints
//! - `auth` - Local access token inspection
//! - `session` - Session guard and session data cache
//! - `editor` - Debounced autosave controller for one entry
//! - `journal` - Search, mood filter and streak over the journal index
//! - `state` - Wiring of the above

pub mod api;
pub mod auth;
pub mod config;
pub mod editor;
pub mod error;
pub mod journal;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
