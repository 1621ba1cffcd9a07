//! # Subsystem Container
//!
//! Central container holding the subsystem instances of the node with
//! proper lifetime management.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig};
pub use subsystems::{RestoreOutcome, SubsystemContainer};
