mod debounce;
mod normalize;
mod propagate;
mod session;
mod store;

pub(crate) use debounce::{SaveDebouncer, SaveToken, DEFAULT_DEBOUNCE};
pub(crate) use normalize::{
    move_handle, normalize, nudge_handle, rebalance_from_boundaries, rebalance_on_change, Handle,
};
pub(crate) use propagate::{
    clamp_batch_limit, propagate, AllocationSource, PropagationError, PropagationReport,
    PropagationRequest, DEFAULT_BATCH_LIMIT,
};
pub(crate) use session::{AllocationCommand, AllocationSession};
pub(crate) use store::AllocationStore;

#[cfg(test)]
pub(crate) mod testing;
