use std::time::{Duration, Instant};

use crate::models::Allocation;

pub(crate) const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);

/// Identifies one scheduled save. A newer schedule invalidates older tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SaveToken(u64);

#[derive(Debug, Clone)]
struct PendingSave {
    value: Allocation,
    due: Instant,
    token: SaveToken,
}

/// Coalesces rapid allocation changes into a single write.
///
/// Each `schedule` replaces whatever was pending and restarts the window.
/// Nothing here reads the clock; callers pass `now` in.
#[derive(Debug)]
pub(crate) struct SaveDebouncer {
    window: Duration,
    generation: u64,
    pending: Option<PendingSave>,
}

impl SaveDebouncer {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            generation: 0,
            pending: None,
        }
    }

    pub(crate) fn schedule(&mut self, value: Allocation, now: Instant) -> SaveToken {
        self.generation += 1;
        let token = SaveToken(self.generation);
        if self.pending.is_some() {
            tracing::trace!(generation = self.generation, "pending save superseded");
        }
        self.pending = Some(PendingSave {
            value,
            due: now + self.window,
            token,
        });
        token
    }

    /// Drop the pending save if `token` still names it.
    pub(crate) fn cancel(&mut self, token: SaveToken) -> bool {
        match &self.pending {
            Some(p) if p.token == token => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left before the pending save is due, if any.
    pub(crate) fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|p| p.due.saturating_duration_since(now))
    }

    /// Take the pending value once its window has elapsed.
    pub(crate) fn take_due(&mut self, now: Instant) -> Option<Allocation> {
        match &self.pending {
            Some(p) if now >= p.due => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Take the pending value regardless of its deadline.
    pub(crate) fn take_pending(&mut self) -> Option<Allocation> {
        self.pending.take().map(|p| p.value)
    }
}

impl Default for SaveDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
#[path = "debounce_tests.rs"]
mod tests;
