// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cancel-and-rearm timer.
//!
//! Each arm gets a generation number. A firing only counts if its
//! generation is still current when the owner gets to it, so a timer that
//! elapsed just before a re-arm is ignored.

use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            pending: None,
        }
    }

    /// Cancel any pending timer and start a new one. `fire` runs with the new
    /// generation once the interval elapses. Must be called inside a runtime.
    pub fn arm<F>(&mut self, fire: F)
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        let interval = self.interval;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            fire(generation);
        }));
    }

    /// Drop the pending timer. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        match self.pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Claim a firing. `false` for a generation that was cancelled or
    /// superseded.
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.pending.is_none() || generation != self.generation {
            return false;
        }
        self.pending = None;
        true
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
