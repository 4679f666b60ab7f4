//! # Dispatch Outcomes
//!
//! ```text
//! ResolvingAgent ──► Hashing ──► Submitting ──► Accepted
//!        │              │             │
//!        └──────────────┴─────────────┴──────► Suppressed
//! ```

use super::errors::DispatchError;
use super::message::GatewayReply;

/// Steps of one dispatch, in order. Logged as the gate advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    ResolvingAgent,
    Hashing,
    Submitting,
    Accepted,
    Suppressed,
}

/// Whether the boundary may let the message through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Proceed,
    Suppress,
}

/// Why a part of a segmented message was not delivered to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartFailure {
    /// Hash submission failed and unverified sending is not allowed.
    Suppressed(DispatchError),
    /// The gateway could not be reached.
    Transport(String),
    /// The gateway answered with a non-2xx status.
    Rejected(GatewayReply),
}

/// Final result of dispatching one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchReport {
    /// Forward the inbound request to the gateway unchanged.
    ForwardOriginal { verified: bool },
    /// The gate forwarded every part itself; `reply` is the last answer.
    PartsForwarded {
        verified: bool,
        parts: u8,
        reply: GatewayReply,
    },
    /// Forwarding stopped at `ordinal`; earlier parts went out.
    PartFailed { ordinal: u8, failure: PartFailure },
    /// Nothing may be sent.
    Suppressed { reason: Option<DispatchError> },
}

impl DispatchReport {
    pub fn outcome(&self) -> DispatchOutcome {
        match self {
            Self::ForwardOriginal { .. } | Self::PartsForwarded { .. } => DispatchOutcome::Proceed,
            Self::PartFailed { .. } | Self::Suppressed { .. } => DispatchOutcome::Suppress,
        }
    }

    pub fn state(&self) -> DispatchState {
        match self.outcome() {
            DispatchOutcome::Proceed => DispatchState::Accepted,
            DispatchOutcome::Suppress => DispatchState::Suppressed,
        }
    }

    /// Metrics label.
    pub fn verdict(&self) -> &'static str {
        match self {
            Self::ForwardOriginal { verified: true } | Self::PartsForwarded { verified: true, .. } => {
                "verified"
            }
            Self::ForwardOriginal { verified: false } | Self::PartsForwarded { verified: false, .. } => {
                "unverified"
            }
            Self::PartFailed { .. } => "part_failed",
            Self::Suppressed { .. } => "suppressed",
        }
    }
}
