#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::models::{Allocation, MonthKey};

use super::AllocationStore;

/// In-memory store that records every batch and can fail on demand.
#[derive(Debug, Default)]
pub(crate) struct FakeStore {
    pub rows: HashMap<(String, MonthKey), Allocation>,
    pub batch_sizes: Vec<usize>,
    /// Fail the commit with this 1-based number.
    pub fail_commit: Option<usize>,
    pub fail_loads: bool,
    pub commits: usize,
}

impl FakeStore {
    pub(crate) fn with_rows(owner: &str, rows: &[(&str, Allocation)]) -> Self {
        let mut store = Self::default();
        for (month, a) in rows {
            store
                .rows
                .insert((owner.to_string(), MonthKey::parse(month).unwrap()), *a);
        }
        store
    }

    pub(crate) fn get(&self, owner: &str, month: &str) -> Option<Allocation> {
        self.rows
            .get(&(owner.to_string(), MonthKey::parse(month).unwrap()))
            .copied()
    }
}

impl AllocationStore for FakeStore {
    fn load_allocation(&self, owner: &str, month: MonthKey) -> Result<Option<Allocation>> {
        if self.fail_loads {
            bail!("store offline");
        }
        Ok(self.rows.get(&(owner.to_string(), month)).copied())
    }

    fn commit_allocations(&mut self, owner: &str, writes: &[(MonthKey, Allocation)]) -> Result<()> {
        self.commits += 1;
        if self.fail_commit == Some(self.commits) {
            bail!("quota exceeded");
        }
        for (month, a) in writes {
            self.rows.insert((owner.to_string(), *month), *a);
        }
        self.batch_sizes.push(writes.len());
        Ok(())
    }
}
