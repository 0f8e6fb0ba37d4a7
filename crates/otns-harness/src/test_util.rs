//! In-memory stand-in for the simulator.
//!
//! [`FakeLauncher`] hands out [`FakeSim`] handles that answer from a
//! script instead of a simulator process and log every call into a shared
//! [`SimRecord`]. The record outlives the handles, so a test can check
//! what the harness sent after the fixture has been dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use otns_common::{NodeId, Partitions};

use crate::control::{SimControl, SimLauncher, Speed};
use crate::error::SimError;

/// Everything the fake simulator has been asked to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimRecord {
    /// Argument lists of every `open`, in order.
    pub opens: Vec<Vec<String>>,
    pub speeds: Vec<Speed>,
    /// Durations passed to `go`, exactly as received.
    pub go_durations: Vec<f64>,
    pub partition_queries: usize,
    pub state_queries: Vec<NodeId>,
    /// Handles that have been closed (repeat closes are not counted).
    pub closes: usize,
    /// Sum of all `go` durations across handles.
    pub now: f64,
}

impl SimRecord {
    /// Handles opened but not yet closed.
    pub fn open_handles(&self) -> usize {
        self.opens.len().saturating_sub(self.closes)
    }
}

/// Scripted answers plus injected failures.
#[derive(Debug, Clone, Default)]
struct Script {
    partitions: Partitions,
    states: HashMap<NodeId, String>,
    fail_open: Option<String>,
    fail_speed: bool,
    fail_close: bool,
}

fn lock(record: &Mutex<SimRecord>) -> MutexGuard<'_, SimRecord> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Launcher ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    script: Script,
    record: Arc<Mutex<SimRecord>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition membership every new handle starts with.
    pub fn with_partitions(mut self, partitions: Partitions) -> Self {
        self.script.partitions = partitions;
        self
    }

    pub fn with_state(mut self, node: NodeId, state: &str) -> Self {
        self.script.states.insert(node, state.to_string());
        self
    }

    /// Make every `open` fail with `message`.
    pub fn fail_open(mut self, message: &str) -> Self {
        self.script.fail_open = Some(message.to_string());
        self
    }

    pub fn fail_speed(mut self) -> Self {
        self.script.fail_speed = true;
        self
    }

    /// Make `close` report an error. The handle still counts as closed.
    pub fn fail_close(mut self) -> Self {
        self.script.fail_close = true;
        self
    }

    /// Copy of the calls recorded so far.
    pub fn record(&self) -> SimRecord {
        lock(&self.record).clone()
    }
}

impl SimLauncher for FakeLauncher {
    type Handle = FakeSim;

    fn open(&self, args: &[String]) -> Result<FakeSim, SimError> {
        if let Some(message) = &self.script.fail_open {
            return Err(SimError::Launch(message.clone()));
        }
        lock(&self.record).opens.push(args.to_vec());
        Ok(FakeSim {
            script: self.script.clone(),
            record: Arc::clone(&self.record),
            closed: false,
        })
    }
}

// ── Handle ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FakeSim {
    script: Script,
    record: Arc<Mutex<SimRecord>>,
    closed: bool,
}

impl FakeSim {
    /// Replace the partitions reported from now on.
    pub fn set_partitions(&mut self, partitions: Partitions) {
        self.script.partitions = partitions;
    }

    pub fn set_state(&mut self, node: NodeId, state: &str) {
        self.script.states.insert(node, state.to_string());
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), SimError> {
        if self.closed {
            Err(SimError::Closed)
        } else {
            Ok(())
        }
    }
}

impl SimControl for FakeSim {
    fn set_speed(&mut self, speed: Speed) -> Result<(), SimError> {
        self.ensure_open()?;
        if self.script.fail_speed {
            return Err(SimError::Command {
                command: format!("speed {}", speed.value()),
                message: "speed rejected".to_string(),
            });
        }
        lock(&self.record).speeds.push(speed);
        Ok(())
    }

    fn go(&mut self, duration: f64) -> Result<(), SimError> {
        self.ensure_open()?;
        let mut record = lock(&self.record);
        record.go_durations.push(duration);
        record.now += duration;
        Ok(())
    }

    fn partitions(&mut self) -> Result<Partitions, SimError> {
        self.ensure_open()?;
        lock(&self.record).partition_queries += 1;
        Ok(self.script.partitions.clone())
    }

    fn get_state(&mut self, node: NodeId) -> Result<String, SimError> {
        self.ensure_open()?;
        lock(&self.record).state_queries.push(node);
        self.script
            .states
            .get(&node)
            .cloned()
            .ok_or_else(|| SimError::Command {
                command: format!("node {node} state"),
                message: "node not found".to_string(),
            })
    }

    fn close(&mut self) -> Result<(), SimError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        lock(&self.record).closes += 1;
        if self.script.fail_close {
            return Err(SimError::Command {
                command: "exit".to_string(),
                message: "simulator did not exit cleanly".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otns_common::PartitionId;

    #[test]
    fn records_calls_across_handle_lifetime() {
        let launcher = FakeLauncher::new().with_state(1, "leader");
        {
            let mut sim = launcher.open(&["-log".to_string()]).unwrap();
            sim.set_speed(Speed::Max).unwrap();
            sim.go(2.0).unwrap();
            sim.go(0.5).unwrap();
            assert_eq!(sim.get_state(1).unwrap(), "leader");
            sim.close().unwrap();
        }
        let record = launcher.record();
        assert_eq!(record.opens, vec![vec!["-log".to_string()]]);
        assert_eq!(record.speeds, vec![Speed::Max]);
        assert_eq!(record.go_durations, vec![2.0, 0.5]);
        assert_eq!(record.now, 2.5);
        assert_eq!(record.state_queries, vec![1]);
        assert_eq!(record.open_handles(), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let launcher = FakeLauncher::new();
        let mut sim = launcher.open(&[]).unwrap();
        sim.close().unwrap();
        sim.close().unwrap();
        assert!(sim.is_closed());
        assert_eq!(launcher.record().closes, 1);
    }

    #[test]
    fn closed_handle_rejects_commands() {
        let launcher = FakeLauncher::new();
        let mut sim = launcher.open(&[]).unwrap();
        sim.close().unwrap();
        assert!(matches!(sim.go(1.0), Err(SimError::Closed)));
        assert!(matches!(sim.partitions(), Err(SimError::Closed)));
    }

    #[test]
    fn unknown_node_is_a_command_error() {
        let launcher = FakeLauncher::new();
        let mut sim = launcher.open(&[]).unwrap();
        let err = sim.get_state(42).unwrap_err();
        assert!(err.to_string().contains("node 42 state"), "{err}");
    }

    #[test]
    fn handles_see_later_partition_updates() {
        let launcher = FakeLauncher::new()
            .with_partitions([(PartitionId(0), vec![1, 2])].into_iter().collect());
        let mut sim = launcher.open(&[]).unwrap();
        assert!(sim.partitions().unwrap().has_unassigned());

        sim.set_partitions([(PartitionId(0x10), vec![1, 2])].into_iter().collect());
        let pars = sim.partitions().unwrap();
        assert_eq!(pars.len(), 1);
        assert!(!pars.has_unassigned());
        assert_eq!(launcher.record().partition_queries, 2);
    }

    #[test]
    fn injected_failures() {
        let err = FakeLauncher::new().fail_open("no binary").open(&[]).unwrap_err();
        assert!(matches!(err, SimError::Launch(_)));

        let launcher = FakeLauncher::new().fail_speed().fail_close();
        let mut sim = launcher.open(&[]).unwrap();
        assert!(sim.set_speed(Speed::Max).is_err());
        assert!(sim.close().is_err());
        assert_eq!(launcher.record().closes, 1);
    }
}
