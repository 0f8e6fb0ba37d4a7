//! Node identifiers and Thread device mode flags.

use serde::{Deserialize, Serialize};

/// Simulator-assigned node identifier.
pub type NodeId = i32;

/// Largest node id the simulator hands out.
pub const MAX_NODE_ID: NodeId = 0xffff;

/// Never assigned to a node.
pub const INVALID_NODE_ID: NodeId = 0;

/// Addresses every node at once.
pub const BROADCAST_NODE_ID: NodeId = -1;

// ── Node Mode ───────────────────────────────────────────────────────

/// Thread device mode, written as a subset of the `rsdn` flag characters.
///
/// | char | flag |
/// |------|------|
/// | `r`  | receiver on when idle |
/// | `s`  | secure data requests |
/// | `d`  | full Thread device |
/// | `n`  | full network data |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeMode {
    pub rx_on_when_idle: bool,
    pub secure_data_requests: bool,
    pub full_thread_device: bool,
    pub full_network_data: bool,
}

impl Default for NodeMode {
    /// A router-capable device: every flag set.
    fn default() -> Self {
        Self {
            rx_on_when_idle: true,
            secure_data_requests: true,
            full_thread_device: true,
            full_network_data: true,
        }
    }
}

impl NodeMode {
    /// Mode with every flag cleared.
    pub const fn empty() -> Self {
        Self {
            rx_on_when_idle: false,
            secure_data_requests: false,
            full_thread_device: false,
            full_network_data: false,
        }
    }

    /// Parse a mode string such as `"rsdn"` or `"rn"`.
    ///
    /// Each recognized character sets its flag; anything else is skipped,
    /// so parsing never fails.
    pub fn parse(s: &str) -> Self {
        let mut mode = Self::empty();
        for c in s.chars() {
            match c {
                'r' => mode.rx_on_when_idle = true,
                's' => mode.secure_data_requests = true,
                'd' => mode.full_thread_device = true,
                'n' => mode.full_network_data = true,
                _ => {}
            }
        }
        mode
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }
}

impl std::fmt::Display for NodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        let flags = [
            (self.rx_on_when_idle, 'r'),
            (self.secure_data_requests, 's'),
            (self.full_thread_device, 'd'),
            (self.full_network_data, 'n'),
        ];
        for (set, c) in flags {
            if set {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for NodeMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
