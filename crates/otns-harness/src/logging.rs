//! Process-wide log setup for simulator tests.
//!
//! Installs a `tracing-subscriber` fmt layer once per process. Output goes
//! through the libtest writer so it is captured per test and shown only for
//! failures (or with `--nocapture`). The same one-time step takes the
//! allocator baseline (see [`crate::alloc_stats`]) and reports a config
//! file that failed to load.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use crate::alloc_stats;
use crate::config::HarnessConfig;

static INIT: Once = Once::new();

/// Initialize logging with the globally configured filter.
pub fn init() {
    init_with(&HarnessConfig::global().log_filter);
}

/// Initialize logging, falling back to `default_filter` when `RUST_LOG` is unset.
///
/// Only the first call in a process has any effect. A subscriber installed
/// elsewhere beforehand is left in place.
pub fn init_with(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_test_writer()
            .try_init()
            .is_ok();
        let alloc = alloc_stats::start();
        tracing::debug!(
            installed,
            alloc_tracking = alloc.is_some(),
            "harness logging initialized"
        );
        if let Some(err) = HarnessConfig::resolved_global_error() {
            tracing::warn!(error = %err, "falling back to default harness config");
        }
    });
}

pub fn is_initialized() -> bool {
    INIT.is_completed()
}
