use anyhow::Result;

use crate::models::{Allocation, MonthKey};

/// Persistence for per-month allocations, addressed by owner and month.
pub(crate) trait AllocationStore {
    /// The stored allocation, or `None` when the month has never been set.
    fn load_allocation(&self, owner: &str, month: MonthKey) -> Result<Option<Allocation>>;

    /// Write every entry as one atomic batch, merging over existing rows.
    fn commit_allocations(&mut self, owner: &str, writes: &[(MonthKey, Allocation)]) -> Result<()>;

    fn save_allocation(&mut self, owner: &str, month: MonthKey, allocation: Allocation) -> Result<()> {
        self.commit_allocations(owner, &[(month, allocation)])
    }

    fn has_allocation(&self, owner: &str, month: MonthKey) -> Result<bool> {
        Ok(self.load_allocation(owner, month)?.is_some())
    }
}
