//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! - `container/` - Configuration and the subsystem container
//! - `runtime` - Startup, periodic persistence and graceful shutdown

pub mod container;
pub mod runtime;

pub use container::{ConfigError, NodeConfig, RestoreOutcome, SubsystemContainer};
pub use runtime::NodeRuntime;
