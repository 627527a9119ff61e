// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};

use super::entry_date;
use crate::models::JournalEntry;

/// Consecutive days with at least one entry, counted back from `today`.
///
/// A streak that reached yesterday is still alive when nothing has been
/// written today yet.
pub fn writing_streak(entries: &[JournalEntry], today: NaiveDate) -> u32 {
    let written: BTreeSet<NaiveDate> = entries.iter().filter_map(|e| entry_date(&e.date)).collect();

    let mut day = if written.contains(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) => yesterday,
            None => return 0,
        }
    };

    let mut streak = 0;
    while written.contains(&day) {
        streak += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryId;

    fn on(dates: &[&str]) -> Vec<JournalEntry> {
        dates
            .iter()
            .enumerate()
            .map(|(i, date)| JournalEntry {
                id: EntryId(i as i64 + 1),
                title: "t".to_string(),
                date: date.to_string(),
                content: String::new(),
                user: None,
                mood_stats: None,
                insights: None,
            })
            .collect()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn counts_back_from_today() {
        let entries = on(&["2025-06-03", "2025-06-02", "2025-06-01", "2025-05-30"]);
        assert_eq!(writing_streak(&entries, day("2025-06-03")), 3);
    }

    #[test]
    fn yesterday_keeps_the_streak() {
        let entries = on(&["2025-06-02", "2025-06-01"]);
        assert_eq!(writing_streak(&entries, day("2025-06-03")), 2);
    }

    #[test]
    fn gap_breaks_the_streak() {
        let entries = on(&["2025-06-01"]);
        assert_eq!(writing_streak(&entries, day("2025-06-03")), 0);
        assert_eq!(writing_streak(&[], day("2025-06-03")), 0);
    }

    #[test]
    fn several_entries_one_day_count_once() {
        let entries = on(&["2025-06-03", "2025-06-03", "not a date"]);
        assert_eq!(writing_streak(&entries, day("2025-06-03")), 1);
    }
}
