//! Percentage arithmetic for the needs/wants/savings split.
//!
//! Every function here is total: out-of-range, fractional and non-finite
//! input is clamped instead of rejected, so an interactive control always
//! lands on a valid [`Allocation`].

use crate::models::{Allocation, Slot};

/// Upper bound on residual-correction steps. Independent rounding of three
/// values leaves a residual of at most 1, so this is never reached.
const MAX_CORRECTIONS: usize = 6;

/// Largest minimum segment that still leaves room for three segments.
const MAX_MIN_SEGMENT: i32 = 33;

/// Clamp into `0..=100` and round to the nearest integer. NaN becomes 0.
pub(crate) fn clamp_pct(x: f64) -> u8 {
    if x.is_nan() {
        return 0;
    }
    // f64::round rounds halves away from zero, which is "up" on 0..=100.
    x.clamp(0.0, 100.0).round() as u8
}

fn build(parts: [i32; 3]) -> Allocation {
    let [n, w, s] = parts.map(|p| p.clamp(0, 100) as u8);
    let built = Allocation::from_parts(n, w, s);
    debug_assert!(built.is_some(), "normalizer produced {parts:?}");
    built.unwrap_or_default()
}

/// Index of the largest value; ties go to the lowest index.
fn largest(parts: &[i32; 3], nonzero_only: bool) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in parts.iter().enumerate() {
        if nonzero_only && v == 0 {
            continue;
        }
        match best {
            Some(b) if parts[b] >= v => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Map any triple onto a valid allocation, keeping the proportions as
/// closely as integer rounding allows.
pub(crate) fn normalize(needs: f64, wants: f64, savings: f64) -> Allocation {
    let mut parts = [
        i32::from(clamp_pct(needs)),
        i32::from(clamp_pct(wants)),
        i32::from(clamp_pct(savings)),
    ];

    let sum: i32 = parts.iter().sum();
    if sum == 0 {
        return Allocation::DEFAULT;
    }
    if sum == 100 {
        return build(parts);
    }

    let k = 100.0 / f64::from(sum);
    for p in parts.iter_mut() {
        *p = (f64::from(*p) * k).round() as i32;
    }

    let mut corrections = 0;
    loop {
        let diff = 100 - parts.iter().sum::<i32>();
        if diff == 0 || corrections >= MAX_CORRECTIONS {
            break;
        }
        if diff > 0 {
            if let Some(i) = largest(&parts, false) {
                parts[i] += 1;
            }
        } else if let Some(i) = largest(&parts, true) {
            parts[i] -= 1;
        } else {
            break;
        }
        corrections += 1;
    }
    if corrections > 0 {
        tracing::debug!(corrections, ?parts, "rounding residual corrected");
    }

    if parts.iter().sum::<i32>() == 100 {
        build(parts)
    } else {
        Allocation::DEFAULT
    }
}

/// Set one slot directly and share the rest between the other two slots in
/// proportion to their current values.
pub(crate) fn rebalance_on_change(current: Allocation, changed: Slot, new_value: f64) -> Allocation {
    let value = i32::from(clamp_pct(new_value));
    let remainder = 100 - value;
    let (first, second) = changed.others();
    let p = i32::from(current.get(first));
    let q = i32::from(current.get(second));

    let first_share = if p + q == 0 {
        remainder / 2
    } else {
        (f64::from(remainder) * f64::from(p) / f64::from(p + q)).round() as i32
    };

    let mut parts = [0; 3];
    parts[changed.index()] = value;
    parts[first.index()] = first_share;
    parts[second.index()] = remainder - first_share;
    build(parts)
}

/// Build an allocation from the two cut points of a three-segment bar.
///
/// `low_cut` separates needs from wants and `high_cut` separates wants from
/// savings. Each segment is kept at least `min_segment` wide.
pub(crate) fn rebalance_from_boundaries(low_cut: f64, high_cut: f64, min_segment: f64) -> Allocation {
    let min = i32::from(clamp_pct(min_segment)).min(MAX_MIN_SEGMENT);
    let low = i32::from(clamp_pct(low_cut)).clamp(min, 100 - 2 * min);
    let high = i32::from(clamp_pct(high_cut)).clamp(low + min, 100 - min);
    build([low, high - low, 100 - high])
}

/// One of the two draggable dividers on the allocation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handle {
    /// Between needs and wants.
    Low,
    /// Between wants and savings.
    High,
}

impl Handle {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" | "1" => Some(Self::Low),
            "high" | "2" => Some(Self::High),
            _ => None,
        }
    }
}

/// Drag a divider to `position`, pushing the other divider only as far as
/// the minimum segment width requires.
pub(crate) fn move_handle(
    current: Allocation,
    handle: Handle,
    position: f64,
    min_segment: f64,
) -> Allocation {
    let min = i32::from(clamp_pct(min_segment)).min(MAX_MIN_SEGMENT);
    let (a, b) = current.boundaries();
    let (a, b) = (i32::from(a), i32::from(b));
    let pos = i32::from(clamp_pct(position));

    let (low, high) = match handle {
        Handle::Low => {
            let low = pos.clamp(min, 100 - 2 * min);
            let high = b.min(100 - min).max(low + min);
            (low, high)
        }
        Handle::High => {
            let high = pos.min(100 - min).max(a + min);
            let low = a.min(high - min);
            (low, high)
        }
    };
    rebalance_from_boundaries(f64::from(low), f64::from(high), f64::from(min))
}

/// Step a divider by `delta` points from where it currently sits.
pub(crate) fn nudge_handle(
    current: Allocation,
    handle: Handle,
    delta: i32,
    min_segment: f64,
) -> Allocation {
    let (a, b) = current.boundaries();
    let from = match handle {
        Handle::Low => i32::from(a),
        Handle::High => i32::from(b),
    };
    move_handle(current, handle, f64::from(from.saturating_add(delta)), min_segment)
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
