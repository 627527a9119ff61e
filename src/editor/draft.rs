// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-held copy of the entry being edited.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::models::{EntryId, Insight, JournalEntry, JournalPayload, MoodStats};

/// A new entry is only created once the title or content is this long.
pub const MIN_TITLE_CHARS: usize = 3;
pub const MIN_CONTENT_CHARS: usize = 5;

/// Wire format of [`DraftEntry::date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryField {
    Title,
    Date,
    Content,
}

/// Autosave state of a draft.
///
/// ```text
/// Loading ──► Clean | New
/// New ──► Creating ──► Clean
/// Clean ──► Dirty ──► Saving ──► Clean
/// Clean | Dirty ──► Emptying ──► Deleted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Loading,
    New,
    Creating,
    Clean,
    Dirty,
    Saving,
    Emptying,
    Deleted,
}

impl EntryStatus {
    /// A create, update or delete is outstanding.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            EntryStatus::Creating | EntryStatus::Saving | EntryStatus::Emptying
        )
    }

    /// Edits are not applied in these states.
    pub fn rejects_edits(self) -> bool {
        matches!(
            self,
            EntryStatus::Loading | EntryStatus::Emptying | EntryStatus::Deleted
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftEntry {
    /// `None` until the server has created the entry.
    pub id: Option<EntryId>,
    pub title: String,
    pub date: String,
    pub content: String,
    pub status: EntryStatus,
    pub mood_stats: Option<MoodStats>,
    pub insights: Option<Insight>,
}

impl DraftEntry {
    /// Empty draft dated `today`.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            id: None,
            title: String::new(),
            date: today.format(DATE_FORMAT).to_string(),
            content: String::new(),
            status: EntryStatus::New,
            mood_stats: None,
            insights: None,
        }
    }

    pub fn blank_today() -> Self {
        Self::blank(Utc::now().date_naive())
    }

    /// Placeholder while the entry is fetched.
    pub fn loading(id: EntryId) -> Self {
        Self {
            id: Some(id),
            status: EntryStatus::Loading,
            ..Self::blank_today()
        }
    }

    pub fn from_entry(entry: JournalEntry) -> Self {
        Self {
            id: Some(entry.id),
            title: entry.title,
            date: entry.date,
            content: entry.content,
            status: EntryStatus::Clean,
            mood_stats: entry.mood_stats,
            insights: entry.insights,
        }
    }

    /// Write `value` into `field`. Returns `false` when nothing changed.
    ///
    /// Changing the content drops the mood and insight annotations, which
    /// describe the previous text.
    pub fn apply(&mut self, field: EntryField, value: String) -> bool {
        let slot = match field {
            EntryField::Title => &mut self.title,
            EntryField::Date => &mut self.date,
            EntryField::Content => &mut self.content,
        };
        if *slot == value {
            return false;
        }
        *slot = value;

        if field == EntryField::Content {
            self.mood_stats = None;
            self.insights = None;
        }
        true
    }

    pub fn meets_creation_threshold(&self) -> bool {
        self.title.chars().count() >= MIN_TITLE_CHARS
            || self.content.chars().count() >= MIN_CONTENT_CHARS
    }

    pub fn is_blank(&self) -> bool {
        self.title.is_empty() && self.content.is_empty()
    }

    /// Created server-side, then fully erased: must be deleted.
    pub fn is_abandoned(&self) -> bool {
        self.id.is_some()
            && self.is_blank()
            && !matches!(
                self.status,
                EntryStatus::Loading | EntryStatus::Emptying | EntryStatus::Deleted
            )
    }

    pub fn payload(&self) -> JournalPayload {
        JournalPayload {
            title: self.title.clone(),
            date: self.date.clone(),
            content: self.content.clone(),
        }
    }
}
