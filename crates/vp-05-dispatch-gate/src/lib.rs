//! # Dispatch Gate Subsystem (VP-05)
//!
//! Sits between the inbound SMS interface and the gateway. Every message
//! passes the gate, which registers verification hashes for it and decides
//! whether it may go out.
//!
//! ## Architecture
//!
//! ```text
//! OutboundMessage ──► DispatchGate ──► AgentDirectory       (sender → agent)
//!                          │     ──► VerificationBackend  (keys, storeHashes)
//!                          │
//!                          ├──► ForwardOriginal / Suppressed
//!                          └──► PartForwarder (one part at a time, in order)
//! ```
//!
//! ## Security Notes
//!
//! - Agent private keys are decoded once per message and zeroized on drop.
//! - A message is never split further when the caller already sent a UDH.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::errors::DispatchError;
pub use domain::message::{GatewayReply, OutboundMessage};
pub use domain::outcome::{DispatchOutcome, DispatchReport, DispatchState, PartFailure};
pub use domain::policy::{FallbackPolicy, GateConfig};
pub use ports::inbound::MessageDispatch;
pub use ports::outbound::{AgentDirectory, PartForwarder, VerificationBackend};
pub use service::DispatchGate;
