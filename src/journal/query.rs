// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Search, mood filter and ordering for the journal list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{entry_date, long_date};
use crate::models::JournalEntry;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("unknown mood '{0}' (expected happy, sad, anger, fear or disgust)")]
    UnknownMood(String),

    #[error("unknown date order '{0}' (expected newest or oldest)")]
    UnknownOrder(String),
}

/// Moods offered by the list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Sad,
    Anger,
    Fear,
    Disgust,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Happy, Mood::Sad, Mood::Anger, Mood::Fear, Mood::Disgust];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Anger => "Anger",
            Mood::Fear => "Fear",
            Mood::Disgust => "Disgust",
        }
    }

    /// Mood the list shows for `entry`. Entries that were never analyzed
    /// count as happy; a dominant mood outside the filter set has none.
    pub fn of(entry: &JournalEntry) -> Option<Mood> {
        match entry.dominant_mood() {
            None => Some(Mood::Happy),
            Some(mood) => mood.parse().ok(),
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QueryError::UnknownMood(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl FromStr for DateOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(DateOrder::NewestFirst),
            "oldest" => Ok(DateOrder::OldestFirst),
            other => Err(QueryError::UnknownOrder(other.to_string())),
        }
    }
}

/// Filter and ordering applied to the journal index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalQuery {
    pub search: String,
    /// Empty means every mood.
    pub moods: Vec<Mood>,
    pub order: DateOrder,
}

impl JournalQuery {
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn mood(mut self, mood: Mood) -> Self {
        if !self.moods.contains(&mood) {
            self.moods.push(mood);
        }
        self
    }

    pub fn order(mut self, order: DateOrder) -> Self {
        self.order = order;
        self
    }

    /// Case-insensitive match against title, content, raw date, long-form
    /// date and dominant mood, then the mood filter.
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if !self.moods.is_empty() {
            match Mood::of(entry) {
                Some(mood) if self.moods.contains(&mood) => {}
                _ => return false,
            }
        }

        let needle = self.search.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

        contains(&entry.title)
            || contains(&entry.content)
            || contains(&entry.date)
            || long_date(&entry.date).is_some_and(|d| contains(&d))
            || entry.dominant_mood().is_some_and(contains)
    }

    pub fn apply(&self, entries: &[JournalEntry]) -> Vec<JournalEntry> {
        let mut selected: Vec<JournalEntry> =
            entries.iter().filter(|e| self.matches(e)).cloned().collect();

        selected.sort_by_key(|e| (entry_date(&e.date), e.id));
        if self.order == DateOrder::NewestFirst {
            selected.reverse();
        }
        selected
    }
}
