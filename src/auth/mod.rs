// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Inspection
//!
//! Local, network-free inspection of access tokens.
//!
//! The client never verifies signatures: that is the server's job on every
//! request. It only reads the `exp` claim so the session guard can decide
//! whether a stored token is worth presenting at all.

pub mod claims;

pub use claims::{access_token_expiry, decode_claims, is_unexpired, AccessClaims, ClaimsError};
