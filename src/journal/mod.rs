// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Journal Index Views
//!
//! Pure functions over the journal index held by the session cache:
//! searching, mood filtering, date ordering and the writing streak.

pub mod query;
pub mod streak;

use chrono::NaiveDate;

pub use query::{DateOrder, JournalQuery, Mood, QueryError};
pub use streak::writing_streak;

use crate::editor::draft::DATE_FORMAT;

/// Calendar date of an entry, if its `date` field is well formed.
pub fn entry_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()
}

/// Long-form rendering used by the list view ("June 1, 2025").
pub fn long_date(date: &str) -> Option<String> {
    entry_date(date).map(|d| d.format("%B %-d, %Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates() {
        assert_eq!(entry_date("2025-06-01"), NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(entry_date("01/06/2025"), None);
        assert_eq!(long_date("2025-06-01").as_deref(), Some("June 1, 2025"));
        assert_eq!(long_date("2025-12-25").as_deref(), Some("December 25, 2025"));
        assert_eq!(long_date(""), None);
    }
}
