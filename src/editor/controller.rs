// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Entry Lifecycle Controller
//!
//! Turns a stream of field edits for one entry into create, update and
//! delete calls.
//!
//! ## Task Model
//!
//! The draft is owned by a single spawned task. The
//! [`EntryLifecycleController`] handle talks to it over a command channel;
//! timers and finished requests report back over a second, internal
//! channel. Every transition therefore happens on one task, one message at a
//! time. Dropping the handle stops the task and its timer.
//!
//! ## Ordering
//!
//! - At most one create, update or delete is outstanding per entry.
//! - An edit while a request is outstanding is applied to the draft and
//!   re-arms the debounce. If the debounce elapses before the request lands,
//!   the next save is issued as soon as it does.
//! - A save carries the draft revision it was built from. Landing with an
//!   older revision than the draft's leaves the entry `Dirty`.
//! - An entry with an id whose title and content are both empty is deleted
//!   (once) at the next confirmation point: after loading, at a debounce
//!   boundary, after a request lands, or on leave.
//!
//! Failures are reported as [`EditorEvent::Failed`] and never retried
//! automatically; the next edit starts a new debounce cycle.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::debounce::Debouncer;
use super::draft::{DraftEntry, EntryField, EntryStatus};
use crate::api::ApiClient;
use crate::error::ClientError;
use crate::models::{EmotionAnalysis, EntryId, JournalEntry};
use crate::session::SessionDataCache;

/// Which entry the editor view was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTarget {
    New,
    Existing(EntryId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Load,
    Create,
    Update,
    Delete,
    Analyze,
}

/// Notifications for the surrounding view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The server assigned an id; the view should replace its location.
    Created(EntryId),
    Saved(EntryId),
    /// The entry was erased and removed server-side.
    Deleted(EntryId),
    Failed {
        operation: Operation,
        error: ClientError,
    },
    Analyzed {
        id: EntryId,
        /// `false` when the content changed while the analysis ran.
        attached: bool,
    },
}

enum Command {
    Edit(EntryField, String),
    Leave(oneshot::Sender<()>),
    Analyze(oneshot::Sender<Result<EmotionAnalysis, ClientError>>),
}

enum Internal {
    DebounceElapsed(u64),
    Loaded(Result<JournalEntry, ClientError>),
    Created {
        revision: u64,
        result: Result<JournalEntry, ClientError>,
    },
    Saved {
        revision: u64,
        result: Result<JournalEntry, ClientError>,
    },
    Deleted(Result<(), ClientError>),
    Analyzed {
        content_revision: u64,
        result: Result<EmotionAnalysis, ClientError>,
        reply: oneshot::Sender<Result<EmotionAnalysis, ClientError>>,
    },
}

// =============================================================================
// Handle
// =============================================================================

/// Handle to the editor task for one entry.
pub struct EntryLifecycleController {
    commands: mpsc::UnboundedSender<Command>,
    draft: watch::Receiver<DraftEntry>,
}

impl EntryLifecycleController {
    /// Spawn the editor task. Must be called inside a tokio runtime.
    ///
    /// With a cache, loads are served from it when possible and every save
    /// or delete is written back to it.
    pub fn open(
        api: ApiClient,
        target: EntryTarget,
        debounce: Duration,
        cache: Option<Arc<SessionDataCache>>,
    ) -> (Self, mpsc::UnboundedReceiver<EditorEvent>) {
        let draft = match target {
            EntryTarget::New => DraftEntry::blank_today(),
            EntryTarget::Existing(id) => DraftEntry::loading(id),
        };
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (published, draft_rx) = watch::channel(draft.clone());

        let mut actor = EntryActor {
            api,
            cache,
            draft,
            published,
            debounce: Debouncer::new(debounce),
            revision: 0,
            content_revision: 0,
            queued: false,
            leave_waiters: Vec::new(),
            leave_owed: false,
            leave_flushed: false,
            issued_generation: 0,
            internal: internal_tx,
            events: events_tx,
        };
        if let EntryTarget::Existing(id) = target {
            actor.start_load(id);
        }
        tokio::spawn(actor.run(commands_rx, internal_rx));

        (
            Self {
                commands: commands_tx,
                draft: draft_rx,
            },
            events_rx,
        )
    }

    /// Record an edit. Never blocks and never fails.
    pub fn on_field_change(&self, field: EntryField, value: impl Into<String>) {
        let _ = self.commands.send(Command::Edit(field, value.into()));
    }

    /// Flush before navigating away.
    ///
    /// Cancels the debounce, waits for an outstanding request, then issues
    /// the pending create, update or delete if there is one. Resolves
    /// immediately when nothing is pending.
    pub async fn on_leave(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Leave(tx)).is_err() {
            return;
        }
        let _ = rx.await;
    }

    /// Run the remote emotion analysis for the saved entry.
    ///
    /// Failure leaves the draft unchanged.
    pub async fn analyze(&self) -> Result<EmotionAnalysis, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Analyze(tx))
            .map_err(|_| ClientError::NotSaved)?;
        rx.await.unwrap_or(Err(ClientError::NotSaved))
    }

    /// Snapshot of the draft as of the last handled message.
    pub fn draft(&self) -> DraftEntry {
        self.draft.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DraftEntry> {
        self.draft.clone()
    }
}

// =============================================================================
// Task
// =============================================================================

struct EntryActor {
    api: ApiClient,
    cache: Option<Arc<SessionDataCache>>,
    draft: DraftEntry,
    published: watch::Sender<DraftEntry>,
    debounce: Debouncer,
    /// Bumped on every applied edit.
    revision: u64,
    /// Bumped on content edits only.
    content_revision: u64,
    /// The debounce elapsed while a request was outstanding.
    queued: bool,
    leave_waiters: Vec<oneshot::Sender<()>>,
    /// A save was pending when leave was requested.
    leave_owed: bool,
    /// The leave flush already issued its request.
    leave_flushed: bool,
    /// Cache generation the outstanding create, update or delete was
    /// issued under.
    issued_generation: u64,
    internal: mpsc::UnboundedSender<Internal>,
    events: mpsc::UnboundedSender<EditorEvent>,
}

impl EntryActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut internal: mpsc::UnboundedReceiver<Internal>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(message) = internal.recv() => self.handle_internal(message),
            }
            self.publish();
        }

        self.debounce.cancel();
        debug!(entry_id = ?self.draft.id, status = ?self.draft.status, "Editor closed");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Edit(field, value) => self.on_edit(field, value),
            Command::Leave(reply) => self.on_leave(reply),
            Command::Analyze(reply) => self.start_analysis(reply),
        }
    }

    fn handle_internal(&mut self, message: Internal) {
        match message {
            Internal::DebounceElapsed(generation) => {
                if self.debounce.accept(generation) {
                    self.at_boundary();
                }
            }
            Internal::Loaded(result) => self.on_loaded(result),
            Internal::Created { revision, result } => self.on_created(revision, result),
            Internal::Saved { revision, result } => self.on_saved(revision, result),
            Internal::Deleted(result) => self.on_deleted(result),
            Internal::Analyzed {
                content_revision,
                result,
                reply,
            } => self.on_analyzed(content_revision, result, reply),
        }
    }

    // =========================================================================
    // Edits and timer
    // =========================================================================

    fn on_edit(&mut self, field: EntryField, value: String) {
        if self.draft.status.rejects_edits() {
            debug!(status = ?self.draft.status, ?field, "Editor: edit ignored");
            return;
        }
        if !self.draft.apply(field, value) {
            return;
        }

        self.revision += 1;
        if field == EntryField::Content {
            self.content_revision += 1;
        }
        if self.draft.status == EntryStatus::Clean {
            self.draft.status = EntryStatus::Dirty;
        }

        // A new entry below the threshold has nothing worth creating yet
        if self.draft.id.is_none()
            && self.draft.status == EntryStatus::New
            && !self.draft.meets_creation_threshold()
        {
            self.debounce.cancel();
            return;
        }
        self.arm_debounce();
    }

    fn arm_debounce(&mut self) {
        let internal = self.internal.clone();
        self.debounce.arm(move |generation| {
            let _ = internal.send(Internal::DebounceElapsed(generation));
        });
    }

    fn at_boundary(&mut self) {
        if self.draft.status.is_in_flight() {
            self.queued = true;
            return;
        }
        if self.draft.is_abandoned() {
            self.start_delete();
            return;
        }
        self.start_save();
    }

    // =========================================================================
    // Requests
    // =========================================================================

    fn start_load(&mut self, id: EntryId) {
        let api = self.api.clone();
        let cache = self.cache.clone();
        let internal = self.internal.clone();
        tokio::spawn(async move {
            let result = match cache {
                Some(cache) => cache.entry(id).await,
                None => api.get_journal(id).await,
            };
            let _ = internal.send(Internal::Loaded(result));
        });
    }

    /// Issue the create or update the draft needs. Returns whether a request
    /// was started.
    fn start_save(&mut self) -> bool {
        let revision = self.revision;
        let payload = self.draft.payload();
        let api = self.api.clone();
        let internal = self.internal.clone();

        match (self.draft.id, self.draft.status) {
            (None, EntryStatus::New) if self.draft.meets_creation_threshold() => {
                self.draft.status = EntryStatus::Creating;
                self.stamp_cache_generation();
                debug!(revision, "Editor: creating entry");
                tokio::spawn(async move {
                    let result = api.create_journal(&payload).await;
                    let _ = internal.send(Internal::Created { revision, result });
                });
                true
            }
            (Some(id), EntryStatus::Dirty) => {
                self.draft.status = EntryStatus::Saving;
                self.stamp_cache_generation();
                debug!(entry_id = %id, revision, "Editor: saving entry");
                tokio::spawn(async move {
                    let result = api.update_journal(id, &payload).await;
                    let _ = internal.send(Internal::Saved { revision, result });
                });
                true
            }
            _ => false,
        }
    }

    fn start_delete(&mut self) {
        let Some(id) = self.draft.id else {
            return;
        };
        self.debounce.cancel();
        self.queued = false;
        self.draft.status = EntryStatus::Emptying;
        self.stamp_cache_generation();
        info!(entry_id = %id, "Editor: entry erased, deleting");

        let api = self.api.clone();
        let internal = self.internal.clone();
        tokio::spawn(async move {
            let result = api.delete_journal(id).await;
            let _ = internal.send(Internal::Deleted(result));
        });
    }

    fn stamp_cache_generation(&mut self) {
        if let Some(cache) = &self.cache {
            self.issued_generation = cache.generation();
        }
    }

    fn start_analysis(&mut self, reply: oneshot::Sender<Result<EmotionAnalysis, ClientError>>) {
        let id = match (self.draft.id, self.draft.status) {
            (Some(id), status) if !matches!(status, EntryStatus::Loading | EntryStatus::Deleted) => id,
            _ => {
                let _ = reply.send(Err(ClientError::NotSaved));
                return;
            }
        };

        let content_revision = self.content_revision;
        let api = self.api.clone();
        let internal = self.internal.clone();
        tokio::spawn(async move {
            let result = api.process_emotions(id).await;
            let _ = internal.send(Internal::Analyzed {
                content_revision,
                result,
                reply,
            });
        });
    }

    // =========================================================================
    // Landings
    // =========================================================================

    fn on_loaded(&mut self, result: Result<JournalEntry, ClientError>) {
        if self.draft.status != EntryStatus::Loading {
            return;
        }
        match result {
            Ok(entry) => {
                debug!(entry_id = %entry.id, "Editor: entry loaded");
                self.draft = DraftEntry::from_entry(entry);
                if self.draft.is_abandoned() {
                    self.start_delete();
                }
            }
            Err(error) => {
                warn!(entry_id = ?self.draft.id, error = %error, "Editor: load failed, starting a new entry");
                self.draft = DraftEntry::blank_today();
                self.emit(EditorEvent::Failed {
                    operation: Operation::Load,
                    error,
                });
            }
        }
        self.flush_for_leave();
    }

    fn on_created(&mut self, revision: u64, result: Result<JournalEntry, ClientError>) {
        match result {
            Ok(entry) => {
                let id = entry.id;
                self.draft.id = Some(id);
                self.draft.status = self.settled_status(revision);
                info!(entry_id = %id, "Editor: entry created");
                if let Some(cache) = &self.cache {
                    cache.record_entry(entry, self.issued_generation);
                }
                self.emit(EditorEvent::Created(id));
                self.after_success();
            }
            Err(error) => {
                warn!(error = %error, "Editor: create failed");
                self.draft.status = EntryStatus::New;
                self.queued = false;
                self.emit(EditorEvent::Failed {
                    operation: Operation::Create,
                    error,
                });
            }
        }
        self.flush_for_leave();
    }

    fn on_saved(&mut self, revision: u64, result: Result<JournalEntry, ClientError>) {
        match result {
            Ok(entry) => {
                let id = entry.id;
                self.draft.status = self.settled_status(revision);
                debug!(entry_id = %id, revision, status = ?self.draft.status, "Editor: entry saved");
                if let Some(cache) = &self.cache {
                    cache.record_entry(entry, self.issued_generation);
                }
                self.emit(EditorEvent::Saved(id));
                self.after_success();
            }
            Err(error) => {
                warn!(entry_id = ?self.draft.id, error = %error, "Editor: save failed");
                self.draft.status = EntryStatus::Dirty;
                self.queued = false;
                self.emit(EditorEvent::Failed {
                    operation: Operation::Update,
                    error,
                });
            }
        }
        self.flush_for_leave();
    }

    fn on_deleted(&mut self, result: Result<(), ClientError>) {
        let Some(id) = self.draft.id else {
            return;
        };
        match result {
            Ok(()) => {
                self.draft.status = EntryStatus::Deleted;
                self.debounce.cancel();
                self.queued = false;
                if let Some(cache) = &self.cache {
                    cache.forget_entry(id, self.issued_generation);
                }
                self.emit(EditorEvent::Deleted(id));
            }
            Err(error) => {
                warn!(entry_id = %id, error = %error, "Editor: delete failed");
                self.draft.status = EntryStatus::Dirty;
                self.emit(EditorEvent::Failed {
                    operation: Operation::Delete,
                    error,
                });
            }
        }
        self.flush_for_leave();
    }

    fn on_analyzed(
        &mut self,
        content_revision: u64,
        result: Result<EmotionAnalysis, ClientError>,
        reply: oneshot::Sender<Result<EmotionAnalysis, ClientError>>,
    ) {
        match &result {
            Ok(analysis) => {
                let attached = content_revision == self.content_revision
                    && self.draft.status != EntryStatus::Deleted;
                if attached {
                    self.draft.mood_stats = Some(analysis.mood_stats.clone());
                    self.draft.insights = analysis.insights.clone();
                }
                if let Some(id) = self.draft.id {
                    debug!(entry_id = %id, attached, "Editor: analysis finished");
                    self.emit(EditorEvent::Analyzed { id, attached });
                }
            }
            Err(error) => {
                warn!(entry_id = ?self.draft.id, error = %error, "Editor: analysis failed");
                self.emit(EditorEvent::Failed {
                    operation: Operation::Analyze,
                    error: error.clone(),
                });
            }
        }
        let _ = reply.send(result);
    }

    /// `Clean` if no edit arrived since `revision` was sent.
    fn settled_status(&self, revision: u64) -> EntryStatus {
        if revision == self.revision {
            EntryStatus::Clean
        } else {
            EntryStatus::Dirty
        }
    }

    fn after_success(&mut self) {
        if self.draft.is_abandoned() {
            self.start_delete();
            return;
        }
        if std::mem::take(&mut self.queued) && !self.debounce.is_armed() {
            self.start_save();
        }
    }

    // =========================================================================
    // Leave
    // =========================================================================

    fn on_leave(&mut self, reply: oneshot::Sender<()>) {
        let had_timer = self.debounce.cancel();
        let queued = std::mem::take(&mut self.queued);
        self.leave_owed |= had_timer || queued;
        self.leave_waiters.push(reply);
        self.flush_for_leave();
    }

    /// Continue a pending leave: issue at most one final request, then
    /// release the waiters.
    fn flush_for_leave(&mut self) {
        if self.leave_waiters.is_empty() || self.draft.status.is_in_flight() {
            return;
        }

        if !self.leave_flushed {
            let owed = std::mem::take(&mut self.leave_owed);
            let started = if self.draft.is_abandoned() {
                self.start_delete();
                true
            } else {
                owed && self.start_save()
            };
            if started {
                self.leave_flushed = true;
                return;
            }
        }

        self.leave_flushed = false;
        self.leave_owed = false;
        for waiter in self.leave_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    fn emit(&self, event: EditorEvent) {
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.published.send_if_modified(|current| {
            if *current == self.draft {
                return false;
            }
            *current = self.draft.clone();
            true
        });
    }
}
