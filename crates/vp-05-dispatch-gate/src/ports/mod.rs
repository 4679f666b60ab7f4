//! Ports of the dispatch gate.

pub mod inbound;
pub mod outbound;
