//! Shared types for driving the OTNS network simulator.
//!
//! This crate contains:
//! - **Nodes** — node identifiers, their sentinels, and Thread device mode flags
//! - **Addresses** — address type selectors and the extended address sentinel
//! - **Partitions** — partition identifiers and the membership map reported by the simulator

pub mod addr;
pub mod node;
pub mod partition;

pub use addr::{AddrType, INVALID_EXT_ADDR};
pub use node::{NodeId, NodeMode, BROADCAST_NODE_ID, INVALID_NODE_ID, MAX_NODE_ID};
pub use partition::{PartitionId, Partitions};
