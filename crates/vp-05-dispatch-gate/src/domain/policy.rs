//! Gate configuration, fixed at construction.

use shared_types::Agent;

/// Whether a message may go out without verification hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Global default; an agent's `send_unverified` overrides it.
    pub send_unverified: bool,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            send_unverified: true,
        }
    }
}

impl FallbackPolicy {
    pub fn new(send_unverified: bool) -> Self {
        Self { send_unverified }
    }

    /// Agent override when present, global default otherwise.
    pub fn allows_unverified(&self, agent: Option<&Agent>) -> bool {
        agent
            .and_then(|a| a.send_unverified)
            .unwrap_or(self.send_unverified)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateConfig {
    pub fallback: FallbackPolicy,
    /// Compare the locally stored agent key with the one the backend holds
    /// and log both.
    pub debug_mode: bool,
}
