//! Copy one allocation across a range of months.
//!
//! Writes go out in sequential batches; each batch is committed before the
//! next is built. A failed commit stops the run and leaves earlier batches
//! in place.

use crate::models::{Allocation, MonthKey};

use super::AllocationStore;

/// Writes per batch when nothing else is configured.
pub(crate) const DEFAULT_BATCH_LIMIT: usize = 450;
/// Hard ceiling on writes in one atomic batch.
pub(crate) const MAX_BATCH_WRITES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AllocationSource {
    /// Whatever is stored for that month, or the default if nothing is.
    CopyFrom(MonthKey),
    Custom(Allocation),
}

#[derive(Debug, Clone)]
pub(crate) struct PropagationRequest {
    pub owner: String,
    pub source: AllocationSource,
    pub start: MonthKey,
    pub end: MonthKey,
    pub only_if_absent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PropagationReport {
    pub allocation: Allocation,
    pub months_considered: usize,
    pub written: usize,
    pub skipped: usize,
    pub batches: usize,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum PropagationError {
    #[error("could not read source allocation for {month}")]
    Source {
        month: MonthKey,
        #[source]
        source: anyhow::Error,
    },
    #[error("could not check existing allocation for {month} ({written} month(s) already written)")]
    Lookup {
        month: MonthKey,
        written: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("batch {batch} failed to commit ({written} month(s) already written)")]
    Commit {
        batch: usize,
        written: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl PropagationError {
    /// Months committed before the failure. These stay persisted.
    pub(crate) fn written(&self) -> usize {
        match self {
            Self::Source { .. } => 0,
            Self::Lookup { written, .. } | Self::Commit { written, .. } => *written,
        }
    }
}

pub(crate) fn clamp_batch_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_BATCH_WRITES)
}

pub(crate) fn resolve_source<S: AllocationStore + ?Sized>(
    store: &S,
    owner: &str,
    source: AllocationSource,
) -> Result<Allocation, PropagationError> {
    match source {
        AllocationSource::Custom(a) => Ok(a),
        AllocationSource::CopyFrom(month) => store
            .load_allocation(owner, month)
            .map(Option::unwrap_or_default)
            .map_err(|source| PropagationError::Source { month, source }),
    }
}

/// Apply the source allocation to every month in `start..=end`.
pub(crate) fn propagate<S: AllocationStore + ?Sized>(
    store: &mut S,
    req: &PropagationRequest,
    batch_limit: usize,
) -> Result<PropagationReport, PropagationError> {
    let limit = clamp_batch_limit(batch_limit);
    let allocation = resolve_source(store, &req.owner, req.source)?;
    let months = MonthKey::range_inclusive(req.start, req.end);

    let mut report = PropagationReport {
        allocation,
        months_considered: months.len(),
        written: 0,
        skipped: 0,
        batches: 0,
    };
    let mut batch: Vec<(MonthKey, Allocation)> = Vec::with_capacity(limit.min(months.len()));

    for month in months {
        if req.only_if_absent {
            let exists = store
                .has_allocation(&req.owner, month)
                .map_err(|source| PropagationError::Lookup {
                    month,
                    written: report.written,
                    source,
                })?;
            if exists {
                report.skipped += 1;
                continue;
            }
        }

        batch.push((month, allocation));
        if batch.len() >= limit {
            commit(store, &req.owner, &mut batch, &mut report)?;
        }
    }

    if !batch.is_empty() {
        commit(store, &req.owner, &mut batch, &mut report)?;
    }

    tracing::info!(
        owner = %req.owner,
        start = %req.start,
        end = %req.end,
        written = report.written,
        skipped = report.skipped,
        batches = report.batches,
        "allocation propagated"
    );
    Ok(report)
}

fn commit<S: AllocationStore + ?Sized>(
    store: &mut S,
    owner: &str,
    batch: &mut Vec<(MonthKey, Allocation)>,
    report: &mut PropagationReport,
) -> Result<(), PropagationError> {
    let number = report.batches + 1;
    tracing::debug!(batch = number, writes = batch.len(), "committing allocation batch");
    store
        .commit_allocations(owner, batch)
        .map_err(|source| PropagationError::Commit {
            batch: number,
            written: report.written,
            source,
        })?;
    report.written += batch.len();
    report.batches = number;
    batch.clear();
    Ok(())
}

#[cfg(test)]
#[path = "propagate_tests.rs"]
mod tests;
