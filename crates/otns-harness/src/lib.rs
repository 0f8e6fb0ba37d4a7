//! Test harness for driving the OTNS network simulator.
//!
//! Each test case owns one simulation-control handle for its whole run:
//! [`SimTestCase`] opens it at maximum speed with verbose simulator
//! logging, exposes timing and assertion helpers, and closes it on every
//! exit path. The simulator itself is an external collaborator reached
//! through the [`SimLauncher`] and [`SimControl`] traits.
//!
//! ```ignore
//! let mut case = SimTestCase::setup(&launcher)?;
//! case.go_conservative(10.0)?;
//! case.assert_form_partitions(1);
//! case.assert_node_state(1, "leader");
//! case.teardown()?;
//! ```

pub mod alloc_stats;
pub mod config;
pub mod control;
pub mod error;
pub mod fixture;
pub mod logging;

pub mod test_util;

pub use config::{HarnessConfig, TimingMode};
pub use control::{SimControl, SimLauncher, Speed, MAX_SIMULATE_SPEED};
pub use error::{HarnessError, SimError};
pub use fixture::SimTestCase;
pub use otns_common::{NodeId, PartitionId, Partitions};
