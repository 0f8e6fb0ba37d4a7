//! Allocator usage sampling for simulator test runs.
//!
//! Built with the `alloc-stats` feature, jemalloc becomes the global
//! allocator of any binary linking this crate and its `allocated` /
//! `resident` counters are sampled at fixture setup and teardown. Without
//! the feature every sample is `None` and nothing is logged.

use once_cell::sync::OnceCell;

#[cfg(feature = "alloc-stats")]
#[global_allocator]
static ALLOCATOR: jemallocator::Jemalloc = jemallocator::Jemalloc;

/// Allocator counters at one point in time, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocSnapshot {
    pub allocated: usize,
    pub resident: usize,
}

impl AllocSnapshot {
    /// Change in allocated bytes since `earlier`.
    pub fn allocated_since(&self, earlier: &AllocSnapshot) -> i64 {
        self.allocated as i64 - earlier.allocated as i64
    }
}

static BASELINE: OnceCell<Option<AllocSnapshot>> = OnceCell::new();

/// Take the process baseline. Only the first call samples.
pub fn start() -> Option<AllocSnapshot> {
    *BASELINE.get_or_init(snapshot)
}

pub fn baseline() -> Option<AllocSnapshot> {
    BASELINE.get().copied().flatten()
}

pub fn is_enabled() -> bool {
    cfg!(feature = "alloc-stats")
}

#[cfg(feature = "alloc-stats")]
pub fn snapshot() -> Option<AllocSnapshot> {
    use jemalloc_ctl::{epoch, stats};

    // counters are cached until the epoch advances
    if let Err(e) = epoch::advance() {
        tracing::warn!(error = %e, "failed to refresh allocator stats");
        return None;
    }
    match (stats::allocated::read(), stats::resident::read()) {
        (Ok(allocated), Ok(resident)) => Some(AllocSnapshot {
            allocated,
            resident,
        }),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "failed to read allocator stats");
            None
        }
    }
}

#[cfg(not(feature = "alloc-stats"))]
pub fn snapshot() -> Option<AllocSnapshot> {
    None
}

/// Log current allocator usage, tagged with the fixture `phase`.
pub fn log_usage(phase: &'static str) -> Option<AllocSnapshot> {
    let now = snapshot()?;
    let growth = baseline().map(|base| now.allocated_since(&base));
    tracing::debug!(
        phase,
        allocated = now.allocated,
        resident = now.resident,
        growth = ?growth,
        "allocator usage"
    );
    Some(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_signed() {
        let before = AllocSnapshot {
            allocated: 4096,
            resident: 8192,
        };
        let after = AllocSnapshot {
            allocated: 1024,
            resident: 8192,
        };
        assert_eq!(after.allocated_since(&before), -3072);
        assert_eq!(before.allocated_since(&after), 3072);
    }

    #[cfg(not(feature = "alloc-stats"))]
    #[test]
    fn disabled_without_feature() {
        assert!(!is_enabled());
        assert_eq!(start(), None);
        assert_eq!(log_usage("setup"), None);
    }

    #[cfg(feature = "alloc-stats")]
    #[test]
    fn samples_live_allocations() {
        assert!(is_enabled());
        start();
        assert!(baseline().is_some());
        let held = vec![0u8; 1 << 20];
        let now = log_usage("setup").unwrap();
        assert!(now.allocated >= held.len());
        assert!(now.resident > 0);
        drop(held);
    }
}
