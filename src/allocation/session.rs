use std::time::{Duration, Instant};

use anyhow::Result;

use crate::models::{Allocation, MonthKey, Slot};

use super::{
    move_handle, normalize, nudge_handle, rebalance_from_boundaries, rebalance_on_change,
    AllocationStore, Handle, SaveDebouncer, SaveToken,
};

/// A user action on the allocation for one month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum AllocationCommand {
    Set { needs: f64, wants: f64, savings: f64 },
    Edit { slot: Slot, value: f64 },
    Move { handle: Handle, position: f64, min_segment: f64 },
    Nudge { handle: Handle, delta: i32, min_segment: f64 },
    /// Place both dividers at once.
    Boundaries { low: f64, high: f64, min_segment: f64 },
    Reset,
}

/// Owns the working allocation of one owner and month.
///
/// Commands replace the value immediately; persistence only happens when
/// the caller polls or flushes. A failed save is remembered in
/// `last_error` and never rolls the value back.
#[derive(Debug)]
pub(crate) struct AllocationSession {
    owner: String,
    month: MonthKey,
    value: Allocation,
    /// Last value known to be persisted, or the opening value.
    saved: Allocation,
    stored: bool,
    debouncer: SaveDebouncer,
    pending: Option<SaveToken>,
    last_error: Option<String>,
}

impl AllocationSession {
    /// Read the stored allocation, or start from the default.
    pub(crate) fn open<S: AllocationStore + ?Sized>(
        store: &S,
        owner: &str,
        month: MonthKey,
        window: Duration,
    ) -> Result<Self> {
        let stored = store.load_allocation(owner, month)?;
        let value = stored.unwrap_or_default();
        Ok(Self {
            owner: owner.to_string(),
            month,
            value,
            saved: value,
            stored: stored.is_some(),
            debouncer: SaveDebouncer::new(window),
            pending: None,
            last_error: None,
        })
    }

    pub(crate) fn owner(&self) -> &str {
        &self.owner
    }

    pub(crate) fn month(&self) -> MonthKey {
        self.month
    }

    pub(crate) fn value(&self) -> Allocation {
        self.value
    }

    /// Whether the month had a stored allocation when opened or has been
    /// saved since.
    pub(crate) fn is_stored(&self) -> bool {
        self.stored
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub(crate) fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn time_until_save(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_until_due(now)
    }

    pub(crate) fn apply(&mut self, command: AllocationCommand, now: Instant) -> Allocation {
        let next = match command {
            AllocationCommand::Set {
                needs,
                wants,
                savings,
            } => normalize(needs, wants, savings),
            AllocationCommand::Edit { slot, value } => rebalance_on_change(self.value, slot, value),
            AllocationCommand::Move {
                handle,
                position,
                min_segment,
            } => move_handle(self.value, handle, position, min_segment),
            AllocationCommand::Nudge {
                handle,
                delta,
                min_segment,
            } => nudge_handle(self.value, handle, delta, min_segment),
            AllocationCommand::Boundaries {
                low,
                high,
                min_segment,
            } => rebalance_from_boundaries(low, high, min_segment),
            AllocationCommand::Reset => Allocation::DEFAULT,
        };
        tracing::debug!(month = %self.month, ?command, %next, "allocation changed");
        self.value = next;
        self.pending = Some(self.debouncer.schedule(next, now));
        next
    }

    /// Drop the unsaved edit and go back to the last saved value.
    /// Returns false when nothing was pending.
    pub(crate) fn discard(&mut self) -> bool {
        match self.pending.take() {
            Some(token) if self.debouncer.cancel(token) => {
                tracing::debug!(month = %self.month, value = %self.saved, "pending edit discarded");
                self.value = self.saved;
                true
            }
            _ => false,
        }
    }

    /// Persist the pending value if its debounce window has elapsed.
    /// Returns true when a write succeeded.
    pub(crate) fn poll<S: AllocationStore + ?Sized>(&mut self, store: &mut S, now: Instant) -> bool {
        match self.debouncer.take_due(now) {
            Some(value) => self.persist(store, value),
            None => false,
        }
    }

    /// Persist any pending value now.
    pub(crate) fn flush<S: AllocationStore + ?Sized>(&mut self, store: &mut S) -> bool {
        match self.debouncer.take_pending() {
            Some(value) => self.persist(store, value),
            None => false,
        }
    }

    fn persist<S: AllocationStore + ?Sized>(&mut self, store: &mut S, value: Allocation) -> bool {
        match store.save_allocation(&self.owner, self.month, value) {
            Ok(()) => {
                tracing::info!(owner = %self.owner, month = %self.month, %value, "allocation saved");
                self.saved = value;
                self.stored = true;
                self.last_error = None;
                true
            }
            Err(e) => {
                tracing::warn!(owner = %self.owner, month = %self.month, error = %e, "allocation save failed");
                self.last_error = Some(format!("Failed to save allocation for {}: {e:#}", self.month));
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
