//! Contract required from the external simulator.
//!
//! The harness never talks to the simulator process directly. A
//! [`SimLauncher`] opens a session with the given command-line arguments
//! and hands back a [`SimControl`] handle; every call on the handle blocks
//! until the simulator answers.

use otns_common::{NodeId, Partitions};

use crate::error::SimError;

/// Speed value the simulator treats as "as fast as possible".
pub const MAX_SIMULATE_SPEED: f64 = 1_000_000.0;

/// Simulation speed relative to real time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Speed {
    #[default]
    Max,
    Factor(f64),
}

impl Speed {
    /// Numeric value sent to the simulator.
    pub fn value(self) -> f64 {
        match self {
            Speed::Max => MAX_SIMULATE_SPEED,
            Speed::Factor(f) => f,
        }
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speed::Max => f.write_str("max"),
            Speed::Factor(v) => write!(f, "{v}"),
        }
    }
}

/// A live simulation session.
pub trait SimControl {
    fn set_speed(&mut self, speed: Speed) -> Result<(), SimError>;

    /// Advance simulated time by `duration` seconds.
    fn go(&mut self, duration: f64) -> Result<(), SimError>;

    /// Current partition membership.
    fn partitions(&mut self) -> Result<Partitions, SimError>;

    /// Role label of `node`, e.g. `"leader"` or `"detached"`.
    fn get_state(&mut self, node: NodeId) -> Result<String, SimError>;

    /// Shut the session down. A second call must be a no-op.
    fn close(&mut self) -> Result<(), SimError>;
}

/// Opens simulation sessions.
pub trait SimLauncher {
    type Handle: SimControl;

    fn open(&self, args: &[String]) -> Result<Self::Handle, SimError>;
}
