// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Client Storage Module
//!
//! Durable client-side state. The only thing persisted is the token pair;
//! everything else the client knows is refetched from the journal API.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//!   session.redb      # accessToken / refreshToken (redb table `session`)
//! ```

pub mod paths;
pub mod token_store;

pub use paths::StoragePaths;
pub use token_store::{MemoryBackend, RedbBackend, TokenBackend, TokenStore};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("token store lock poisoned")]
    Poisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;
