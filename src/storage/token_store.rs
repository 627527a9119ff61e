// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable access/refresh token cell.
//!
//! [`TokenStore`] is the single source of truth for "is a user currently
//! authenticated". It is deliberately dumb: no token validation happens here,
//! and every operation is total. Backend failures are logged and the
//! in-memory value stays authoritative for the rest of the process.
//!
//! ## Table Layout
//!
//! - `session`: fixed key (`accessToken` | `refreshToken`) → token string
//!
//! ## Change Notification
//!
//! Every effective change is published on a `tokio::sync::watch` channel.
//! Changes written by another process (a second client sharing the data
//! directory) are picked up by [`TokenStore::reload`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use redb::{Database, ReadableDatabase, TableDefinition};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{StorageError, StorageResult};
use crate::models::{Session, SessionPatch};

/// Key under which the access token is persisted.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Key under which the refresh token is persisted.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

const SESSION: TableDefinition<&str, &str> = TableDefinition::new("session");

// =============================================================================
// Backends
// =============================================================================

/// Durable storage behind a [`TokenStore`].
pub trait TokenBackend: Send + Sync {
    fn load(&self) -> StorageResult<Session>;
    fn save(&self, session: &Session) -> StorageResult<()>;
}

impl<T: TokenBackend + ?Sized> TokenBackend for Arc<T> {
    fn load(&self) -> StorageResult<Session> {
        (**self).load()
    }

    fn save(&self, session: &Session) -> StorageResult<()> {
        (**self).save(session)
    }
}

/// Process-local backend. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: Mutex<Session>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenBackend for MemoryBackend {
    fn load(&self) -> StorageResult<Session> {
        self.slot
            .lock()
            .map(|s| s.clone())
            .map_err(|_| StorageError::Poisoned)
    }

    fn save(&self, session: &Session) -> StorageResult<()> {
        let mut slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        *slot = session.clone();
        Ok(())
    }
}

/// redb-backed durable backend.
///
/// The database is opened per operation so that several client processes
/// sharing one data directory never hold the file lock for long.
#[derive(Debug, Clone)]
pub struct RedbBackend {
    path: PathBuf,
}

impl RedbBackend {
    /// Prepare a backend at `path`, creating the file and table if needed.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let backend = Self {
            path: path.to_path_buf(),
        };

        // Pre-create the table so later read transactions don't fail
        let db = backend.database()?;
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SESSION)?;
        }
        write_txn.commit()?;

        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn database(&self) -> StorageResult<Database> {
        Ok(Database::create(&self.path)?)
    }
}

impl TokenBackend for RedbBackend {
    fn load(&self) -> StorageResult<Session> {
        let db = self.database()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(SESSION)?;

        let access_token = table.get(ACCESS_TOKEN_KEY)?.map(|v| v.value().to_string());
        let refresh_token = table.get(REFRESH_TOKEN_KEY)?.map(|v| v.value().to_string());

        Ok(Session {
            access_token,
            refresh_token,
        })
    }

    fn save(&self, session: &Session) -> StorageResult<()> {
        let db = self.database()?;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSION)?;
            for (key, value) in [
                (ACCESS_TOKEN_KEY, &session.access_token),
                (REFRESH_TOKEN_KEY, &session.refresh_token),
            ] {
                match value {
                    Some(token) => {
                        table.insert(key, token.as_str())?;
                    }
                    None => {
                        table.remove(key)?;
                    }
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// TokenStore
// =============================================================================

/// Durable key/value holder for the access and refresh tokens.
pub struct TokenStore {
    backend: Box<dyn TokenBackend>,
    current: watch::Sender<Session>,
    write_lock: Mutex<()>,
}

impl TokenStore {
    /// Wrap a backend, loading whatever session it already holds.
    pub fn new(backend: impl TokenBackend + 'static) -> Self {
        let initial = match backend.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Token store: failed to load persisted session, starting logged out");
                Session::default()
            }
        };
        let (current, _) = watch::channel(initial);
        Self {
            backend: Box::new(backend),
            current,
            write_lock: Mutex::new(()),
        }
    }

    /// Non-durable store, used by tests and throwaway sessions.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Open (or create) the durable store at `path`.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self::new(RedbBackend::open(path)?))
    }

    /// Current session snapshot.
    pub fn get(&self) -> Session {
        self.current.borrow().clone()
    }

    /// Overwrite the fields present in `patch`.
    pub fn set(&self, patch: SessionPatch) {
        self.update(|session| patch.apply_to(session));
    }

    /// Forget both tokens.
    pub fn clear(&self) {
        self.update(|session| *session = Session::default());
    }

    /// Receive every future session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.current.subscribe()
    }

    /// Re-read the backend and publish the result if it differs from the
    /// in-memory session. Returns whether anything changed.
    pub fn reload(&self) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let persisted = match self.backend.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Token store: reload failed");
                return false;
            }
        };
        let changed = self.current.send_if_modified(|session| {
            if *session == persisted {
                return false;
            }
            *session = persisted.clone();
            true
        });
        if changed {
            debug!(
                has_access = persisted.access_token.is_some(),
                has_refresh = persisted.refresh_token.is_some(),
                "Token store: picked up external session change"
            );
        }
        changed
    }

    fn update(&self, mutate: impl FnOnce(&mut Session)) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = self.get();
        mutate(&mut next);
        if next == *self.current.borrow() {
            return;
        }

        if let Err(e) = self.backend.save(&next) {
            warn!(error = %e, "Token store: failed to persist session");
        }

        debug!(
            has_access = next.access_token.is_some(),
            has_refresh = next.refresh_token.is_some(),
            "Token store: session updated"
        );
        self.current.send_replace(next);
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.current.borrow();
        f.debug_struct("TokenStore")
            .field("has_access", &session.access_token.is_some())
            .field("has_refresh", &session.refresh_token.is_some())
            .finish()
    }
}
