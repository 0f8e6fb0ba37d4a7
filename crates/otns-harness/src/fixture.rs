//! Per-test simulation fixture.
//!
//! A [`SimTestCase`] owns exactly one simulation-control handle from
//! setup until it is torn down or dropped. Dropping it closes the handle,
//! so a panicking assertion or an early `?` return still releases the
//! simulator. Close errors seen while unwinding are logged rather than
//! raised, which keeps the original failure visible.

use otns_common::NodeId;

use crate::alloc_stats;
use crate::config::HarnessConfig;
use crate::control::{SimControl, SimLauncher};
use crate::error::HarnessError;
use crate::logging;

pub struct SimTestCase<H: SimControl> {
    sim: H,
    config: HarnessConfig,
    closed: bool,
}

impl<H: SimControl> SimTestCase<H> {
    /// Open a handle using the process-wide [`HarnessConfig`].
    ///
    /// Fails with [`HarnessError::Config`] before opening anything if the
    /// config file named in the environment could not be loaded.
    pub fn setup<L>(launcher: &L) -> Result<Self, HarnessError>
    where
        L: SimLauncher<Handle = H>,
    {
        logging::init();
        let config = HarnessConfig::try_global()?;
        Self::setup_with(launcher, config.clone())
    }

    /// Open a handle with the configured arguments and switch it to the configured speed.
    ///
    /// If the speed cannot be set, the freshly opened handle is closed
    /// before the error is returned.
    pub fn setup_with<L>(launcher: &L, config: HarnessConfig) -> Result<Self, HarnessError>
    where
        L: SimLauncher<Handle = H>,
    {
        logging::init_with(&config.log_filter);

        tracing::debug!(
            args = ?config.sim_args,
            timing = %config.timing,
            speed = %config.speed,
            "opening simulation handle"
        );
        let sim = launcher.open(&config.sim_args).map_err(|e| {
            tracing::error!(error = %e, "failed to open simulation handle");
            HarnessError::Open(e)
        })?;

        let mut case = Self {
            sim,
            config,
            closed: false,
        };
        // on error `case` drops here and closes the handle
        case.sim.set_speed(case.config.speed)?;
        tracing::info!("simulation handle ready");
        alloc_stats::log_usage("setup");
        Ok(case)
    }

    /// Run `body` against a fresh fixture and tear it down afterwards.
    ///
    /// A failing body wins over a failing teardown; the teardown error is
    /// then only logged.
    pub fn run<L, F, T, E>(launcher: &L, body: F) -> Result<T, E>
    where
        L: SimLauncher<Handle = H>,
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<HarnessError>,
    {
        logging::init();
        let config = HarnessConfig::try_global()?;
        Self::run_with(launcher, config.clone(), body)
    }

    pub fn run_with<L, F, T, E>(launcher: &L, config: HarnessConfig, body: F) -> Result<T, E>
    where
        L: SimLauncher<Handle = H>,
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<HarnessError>,
    {
        let mut case = Self::setup_with(launcher, config)?;
        match body(&mut case) {
            Ok(value) => {
                case.teardown()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(close_err) = case.teardown() {
                    tracing::warn!(error = %close_err, "teardown failed after test failure");
                }
                Err(err)
            }
        }
    }

    /// Close the handle and report the outcome.
    pub fn teardown(mut self) -> Result<(), HarnessError> {
        self.closed = true;
        let result = self.sim.close();
        alloc_stats::log_usage("teardown");
        match result {
            Ok(()) => {
                tracing::info!("simulation handle closed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to close simulation handle");
                Err(e.into())
            }
        }
    }

    pub fn sim(&self) -> &H {
        &self.sim
    }

    /// Direct access for simulator operations the fixture does not wrap.
    pub fn sim_mut(&mut self) -> &mut H {
        &mut self.sim
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    // ── Timing ──────────────────────────────────────────────────────

    /// Advance the simulation by `duration` seconds, stretched by the
    /// conservative factor when UART timing is not virtual.
    pub fn go_conservative(&mut self, duration: f64) -> Result<(), HarnessError> {
        let factor = self.config.conservative_factor();
        let scaled = duration * factor;
        tracing::debug!(duration, factor, scaled, "advancing simulation");
        self.sim.go(scaled)?;
        Ok(())
    }

    // ── Assertions ──────────────────────────────────────────────────

    /// Succeeds when exactly `count` partitions exist and none is unassigned.
    pub fn check_form_partitions(&mut self, count: usize) -> Result<(), HarnessError> {
        let partitions = self.sim.partitions()?;
        if partitions.len() == count && !partitions.has_unassigned() {
            tracing::debug!(count, %partitions, "partitions formed");
            return Ok(());
        }
        tracing::warn!(expected = count, actual = partitions.len(), %partitions, "partition mismatch");
        Err(HarnessError::PartitionMismatch {
            expected: count,
            partitions,
        })
    }

    #[track_caller]
    pub fn assert_form_partitions(&mut self, count: usize) {
        if let Err(err) = self.check_form_partitions(count) {
            panic!("{err}");
        }
    }

    /// Succeeds when `node` reports exactly `state`.
    pub fn check_node_state(&mut self, node: NodeId, state: &str) -> Result<(), HarnessError> {
        let actual = self.sim.get_state(node)?;
        if actual == state {
            tracing::debug!(node, state, "node state matches");
            return Ok(());
        }
        tracing::warn!(node, expected = state, actual = %actual, "node state mismatch");
        Err(HarnessError::NodeStateMismatch {
            node,
            expected: state.to_string(),
            actual,
        })
    }

    #[track_caller]
    pub fn assert_node_state(&mut self, node: NodeId, state: &str) {
        if let Err(err) = self.check_node_state(node, state) {
            panic!("{err}");
        }
    }
}

impl<H: SimControl> Drop for SimTestCase<H> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let result = self.sim.close();
        alloc_stats::log_usage("teardown");
        match result {
            Ok(()) => tracing::debug!("simulation handle closed on drop"),
            Err(e) if std::thread::panicking() => {
                tracing::error!(error = %e, "failed to close simulation handle while unwinding");
            }
            Err(e) => tracing::warn!(error = %e, "failed to close simulation handle on drop"),
        }
    }
}
