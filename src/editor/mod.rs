// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Entry Editor
//!
//! Autosave for a single journal entry: the draft model, the debounce timer
//! and the lifecycle controller that drives create, update and delete calls.

pub mod controller;
pub mod debounce;
pub mod draft;

pub use controller::{EditorEvent, EntryLifecycleController, EntryTarget, Operation};
pub use debounce::Debouncer;
pub use draft::{DraftEntry, EntryField, EntryStatus};
