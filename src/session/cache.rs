// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory cache of the current session's profile and journals.
//!
//! ## Contents
//!
//! - the user profile (`GET /users/me/`), kept for `ttl`
//! - the journal index (`GET /journals/`), kept for `ttl`
//! - individual entries in an LRU keyed by id, filled from the index, from
//!   `GET /journals/{id}/` and from the editor after each save
//!
//! ## Invalidation
//!
//! Everything is dropped when the session logs out or when the refresh token
//! changes (someone else logged in). A refresh that only replaces the access
//! token keeps the cache. Fetches that started before an invalidation are
//! discarded when they land.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use lru::LruCache;
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::models::{EntryId, JournalEntry, Session, UserProfile};

/// Cached value plus the instant it was fetched.
struct Timed<T> {
    value: T,
    fetched_at: Instant,
}

impl<T: Clone> Timed<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.fetched_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

pub struct SessionDataCache {
    api: ApiClient,
    ttl: Duration,
    profile: RwLock<Option<Timed<UserProfile>>>,
    journals: RwLock<Option<Timed<Vec<JournalEntry>>>>,
    entries: Mutex<LruCache<EntryId, JournalEntry>>,
    /// Refresh token of the session the cached data belongs to.
    owner: Mutex<Option<String>>,
    /// Bumped on every full invalidation.
    generation: AtomicU64,
}

impl SessionDataCache {
    /// - `ttl`: freshness of the profile and the journal index.
    /// - `capacity`: max number of individually cached entries.
    pub fn new(api: ApiClient, ttl: Duration, capacity: usize) -> Self {
        let owner = api.tokens().get().refresh_token;
        Self {
            api,
            ttl,
            profile: RwLock::new(None),
            journals: RwLock::new(None),
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            owner: Mutex::new(owner),
            generation: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        let cached = self
            .profile
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().and_then(|t| t.fresh(self.ttl)));
        if let Some(profile) = cached {
            return Ok(profile);
        }

        let generation = self.generation();
        let profile = self.api.me().await?;
        if self.generation() == generation {
            if let Ok(mut slot) = self.profile.write() {
                *slot = Some(Timed::new(profile.clone()));
            }
        }
        Ok(profile)
    }

    /// The journal index, fetched when missing or stale.
    pub async fn journals(&self) -> Result<Vec<JournalEntry>, ClientError> {
        if let Some(journals) = self.cached_journals() {
            return Ok(journals);
        }
        self.refetch_journals().await
    }

    /// Fetch the journal index regardless of freshness.
    pub async fn refetch_journals(&self) -> Result<Vec<JournalEntry>, ClientError> {
        let generation = self.generation();
        let journals = self.api.list_journals().await?;
        if self.generation() != generation {
            debug!("Session cache: discarding journal index from a previous session");
            return Ok(journals);
        }

        if let Ok(mut entries) = self.entries.lock() {
            for entry in &journals {
                entries.put(entry.id, entry.clone());
            }
        }
        if let Ok(mut slot) = self.journals.write() {
            *slot = Some(Timed::new(journals.clone()));
        }
        Ok(journals)
    }

    pub fn cached_journals(&self) -> Option<Vec<JournalEntry>> {
        self.journals
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().and_then(|t| t.fresh(self.ttl)))
    }

    /// A single entry, served from the LRU when present.
    pub async fn entry(&self, id: EntryId) -> Result<JournalEntry, ClientError> {
        if let Some(entry) = self.cached_entry(id) {
            return Ok(entry);
        }

        let generation = self.generation();
        let entry = self.api.get_journal(id).await?;
        if self.generation() == generation {
            if let Ok(mut entries) = self.entries.lock() {
                entries.put(id, entry.clone());
            }
        }
        Ok(entry)
    }

    pub fn cached_entry(&self, id: EntryId) -> Option<JournalEntry> {
        self.entries.lock().ok()?.get(&id).cloned()
    }

    // =========================================================================
    // Writes from the editor
    // =========================================================================

    /// Store the server's copy of an entry after a create or update.
    ///
    /// `generation` is [`SessionDataCache::generation`] as of when the
    /// request was issued; writes from before an invalidation are dropped.
    pub fn record_entry(&self, entry: JournalEntry, generation: u64) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if self.generation() != generation {
            debug!(entry_id = %entry.id, "Session cache: dropping entry saved under a previous session");
            return;
        }
        if let Ok(mut slot) = self.journals.write() {
            if let Some(index) = slot.as_mut() {
                match index.value.iter_mut().find(|e| e.id == entry.id) {
                    Some(existing) => *existing = entry.clone(),
                    None => index.value.push(entry.clone()),
                }
            }
        }
        entries.put(entry.id, entry);
    }

    /// Drop an entry that was deleted server-side.
    pub fn forget_entry(&self, id: EntryId, generation: u64) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if self.generation() != generation {
            return;
        }
        if let Ok(mut slot) = self.journals.write() {
            if let Some(index) = slot.as_mut() {
                index.value.retain(|e| e.id != id);
            }
        }
        entries.pop(&id);
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    pub fn invalidate_journals(&self) {
        if let Ok(mut slot) = self.journals.write() {
            *slot = None;
        }
    }

    pub fn invalidate_all(&self) {
        // Editor writes check the generation under the entries lock
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.profile.write() {
            *slot = None;
        }
        if let Ok(mut slot) = self.journals.write() {
            *slot = None;
        }
        entries.clear();
    }

    /// React to a token store change.
    pub fn observe(&self, session: &Session) {
        let Ok(mut owner) = self.owner.lock() else {
            self.invalidate_all();
            return;
        };

        if session.is_logged_out() {
            *owner = None;
            self.invalidate_all();
            info!("Session cache: cleared on logout");
            return;
        }

        if session.refresh_token != *owner {
            let had_owner = owner.is_some();
            *owner = session.refresh_token.clone();
            if had_owner {
                self.invalidate_all();
                info!("Session cache: cleared for a new session");
            }
        }
    }

    /// Follow token store changes until `shutdown` fires.
    ///
    /// Every `poll` the store is re-read so that a login or logout by
    /// another process sharing the data directory reaches this one. A zero
    /// `poll` only follows this process's own writes.
    ///
    /// ```rust,ignore
    /// tokio::spawn(cache.clone().run(tokens.subscribe(), poll, shutdown.clone()));
    /// ```
    pub async fn run(
        self: Arc<Self>,
        mut sessions: watch::Receiver<Session>,
        poll: Duration,
        shutdown: CancellationToken,
    ) {
        debug!(poll_ms = poll.as_millis() as u64, "Session cache watcher starting");
        let current = sessions.borrow_and_update().clone();
        self.observe(&current);

        let mut reload = (!poll.is_zero()).then(|| {
            let mut interval = tokio::time::interval(poll);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                changed = sessions.changed() => {
                    if changed.is_err() {
                        debug!("Session cache watcher: token store dropped");
                        return;
                    }
                    let session = sessions.borrow_and_update().clone();
                    self.observe(&session);
                }
                _ = tick(&mut reload) => {
                    // A change is published on `sessions` and handled above
                    self.api.tokens().reload();
                }
                _ = shutdown.cancelled() => {
                    debug!("Session cache watcher shutting down");
                    return;
                }
            }
        }
    }

    /// Bumped by every [`SessionDataCache::invalidate_all`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
