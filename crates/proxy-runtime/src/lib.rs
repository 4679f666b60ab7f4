//! # Verified-SMS Proxy Runtime
//!
//! Library half of the `vsms-proxy` binary, exposed for integration tests.
//!
//! - `container/` - configuration and service wiring
//! - `adapters/` - gate ports over the agent registry, the verification
//!   client and the Kannel gateway
//! - `http/` - the Kannel-compatible front end

pub mod adapters;
pub mod container;
pub mod http;

pub use container::{ProxyConfig, ProxyContainer, RuntimeError};
