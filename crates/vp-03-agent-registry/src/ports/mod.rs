//! Ports of the agent registry.

pub mod inbound;
pub mod outbound;
