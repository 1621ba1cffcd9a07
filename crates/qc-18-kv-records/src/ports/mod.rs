//! # Ports Layer
//!
//! Hexagonal architecture ports for the KV record subsystem.
//!
//! - **Driving Ports (Inbound)**: the index API consumed by transaction
//!   processing and query layers
//! - **Driven Ports (Outbound)**: address decoding, supplied by the host node

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
