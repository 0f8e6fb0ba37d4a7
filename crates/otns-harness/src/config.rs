//! Harness configuration, resolved once per process.
//!
//! Settings come from an optional TOML file (path in
//! `OTNS_HARNESS_CONFIG`) and the `VIRTUAL_TIME_UART` flag. Tests read the
//! resolved value through [`HarnessConfig::global`] and never look at the
//! environment themselves.

use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::control::Speed;
use crate::error::HarnessError;

pub const CONFIG_VERSION: u32 = 1;

/// Set to `1` when the simulator runs with virtual-time UART.
pub const VIRTUAL_TIME_UART_ENV: &str = "VIRTUAL_TIME_UART";

/// Optional path to a TOML harness config file.
pub const CONFIG_PATH_ENV: &str = "OTNS_HARNESS_CONFIG";

const DEFAULT_LOG_FILTER: &str = "debug";

// ── Timing ──────────────────────────────────────────────────────────

/// How the simulated nodes' serial links are timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingMode {
    /// Serial timing is simulated; simulated durations are exact.
    VirtualTimeUart,
    /// Serial links run in real time and may lag the simulation clock.
    #[default]
    RealTimeUart,
}

impl TimingMode {
    /// Multiplier applied to requested durations by `go_conservative`.
    pub const fn conservative_factor(self) -> f64 {
        match self {
            TimingMode::VirtualTimeUart => 1.0,
            TimingMode::RealTimeUart => 3.0,
        }
    }

    /// Mode selected by the raw value of [`VIRTUAL_TIME_UART_ENV`].
    pub fn from_env_flag(value: Option<&str>) -> Self {
        match value {
            Some("1") => TimingMode::VirtualTimeUart,
            _ => TimingMode::RealTimeUart,
        }
    }
}

impl std::fmt::Display for TimingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimingMode::VirtualTimeUart => write!(f, "virtual-time-uart"),
            TimingMode::RealTimeUart => write!(f, "real-time-uart"),
        }
    }
}

// ── Raw Input ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SpeedInput {
    Label(String),
    Factor(f64),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfigInput {
    pub version: Option<u32>,
    pub virtual_time_uart: Option<bool>,
    pub speed: Option<SpeedInput>,
    pub sim_args: Option<Vec<String>>,
    pub log_filter: Option<String>,
}

// ── Resolved Config ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub timing: TimingMode,
    pub speed: Speed,
    /// Arguments passed to [`crate::SimLauncher::open`].
    pub sim_args: Vec<String>,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            timing: TimingMode::default(),
            speed: Speed::Max,
            sim_args: vec!["-log".to_string(), "debug".to_string()],
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl HarnessConfigInput {
    pub fn resolve(self) -> Result<HarnessConfig, HarnessError> {
        let version = self.version.unwrap_or(CONFIG_VERSION);
        if version != CONFIG_VERSION {
            return Err(HarnessError::Config(format!(
                "unsupported config version {version}"
            )));
        }

        let defaults = HarnessConfig::default();

        let timing = match self.virtual_time_uart {
            Some(true) => TimingMode::VirtualTimeUart,
            Some(false) => TimingMode::RealTimeUart,
            None => defaults.timing,
        };

        let speed = match self.speed {
            None => defaults.speed,
            Some(SpeedInput::Label(label)) if label.trim().eq_ignore_ascii_case("max") => {
                Speed::Max
            }
            Some(SpeedInput::Label(label)) => {
                return Err(HarnessError::Config(format!("unknown speed `{label}`")));
            }
            Some(SpeedInput::Factor(f)) if f.is_finite() && f > 0.0 => Speed::Factor(f),
            Some(SpeedInput::Factor(f)) => {
                return Err(HarnessError::Config(format!(
                    "speed must be positive and finite, got {f}"
                )));
            }
        };

        let log_filter = match self.log_filter {
            Some(filter) if !filter.trim().is_empty() => {
                let filter = filter.trim().to_string();
                EnvFilter::try_new(&filter).map_err(|e| {
                    HarnessError::Config(format!("invalid log filter `{filter}`: {e}"))
                })?;
                filter
            }
            _ => defaults.log_filter,
        };

        Ok(HarnessConfig {
            timing,
            speed,
            sim_args: self.sim_args.unwrap_or(defaults.sim_args),
            log_filter,
        })
    }
}

/// Process-wide config plus the error that forced a fallback, if any.
struct GlobalConfig {
    config: HarnessConfig,
    error: Option<HarnessError>,
}

impl GlobalConfig {
    fn resolve() -> Self {
        match HarnessConfig::from_env() {
            Ok(config) => Self {
                config,
                error: None,
            },
            Err(err) => {
                let mut config = HarnessConfig::default();
                config.apply_env_flag(std::env::var(VIRTUAL_TIME_UART_ENV).ok().as_deref());
                // without a subscriber the warning is emitted by logging::init_with instead
                if crate::logging::is_initialized() {
                    tracing::warn!(error = %err, "falling back to default harness config");
                }
                Self {
                    config,
                    error: Some(err),
                }
            }
        }
    }
}

static GLOBAL: Lazy<GlobalConfig> = Lazy::new(GlobalConfig::resolve);

impl HarnessConfig {
    /// Process-wide configuration, resolved from the environment on first use.
    ///
    /// A file that fails to load leaves the defaults (plus the env flag) in
    /// place; the failure is kept in [`HarnessConfig::global_error`].
    pub fn global() -> &'static HarnessConfig {
        &GLOBAL.config
    }

    /// Why the process-wide config fell back to defaults.
    pub fn global_error() -> Option<&'static HarnessError> {
        GLOBAL.error.as_ref()
    }

    /// Process-wide config, or the error that prevented loading it.
    pub fn try_global() -> Result<&'static HarnessConfig, HarnessError> {
        match &GLOBAL.error {
            Some(HarnessError::Config(msg)) => Err(HarnessError::Config(msg.clone())),
            Some(other) => Err(HarnessError::Config(other.to_string())),
            None => Ok(&GLOBAL.config),
        }
    }

    /// Fallback error of the process-wide config, without forcing it to resolve.
    pub(crate) fn resolved_global_error() -> Option<&'static HarnessError> {
        Lazy::get(&GLOBAL).and_then(|global| global.error.as_ref())
    }

    pub fn from_toml_str(input: &str) -> Result<Self, HarnessError> {
        if input.trim().is_empty() {
            return Ok(HarnessConfig::default());
        }
        let parsed: HarnessConfigInput = toml::from_str(input)
            .map_err(|e| HarnessError::Config(format!("invalid config TOML: {e}")))?;
        parsed.resolve()
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, HarnessError> {
        let input = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&input)
    }

    /// Load the optional config file, then apply the virtual-time flag.
    pub fn from_env() -> Result<Self, HarnessError> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_toml_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env_flag(std::env::var(VIRTUAL_TIME_UART_ENV).ok().as_deref());
        Ok(config)
    }

    /// A set flag forces virtual-time UART; an unset or other value leaves the config alone.
    pub fn apply_env_flag(&mut self, value: Option<&str>) {
        if TimingMode::from_env_flag(value) == TimingMode::VirtualTimeUart {
            self.timing = TimingMode::VirtualTimeUart;
        }
    }

    pub fn with_timing(mut self, timing: TimingMode) -> Self {
        self.timing = timing;
        self
    }

    pub fn conservative_factor(&self) -> f64 {
        self.timing.conservative_factor()
    }
}
