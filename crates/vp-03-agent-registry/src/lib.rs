//! # Agent Registry Subsystem (VP-03)
//!
//! Loads agent records, maps sender identifiers to agents and registers
//! fresh hashing keys.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!  sender id ───► │ AgentRegistry (cached/live)  │ ───► Arc<Agent>
//!                 └──────────────┬───────────────┘
//!                                │ AgentStore
//!                 ┌──────────────┴───────────────┐
//!                 │ FileAgentStore │ HttpAgentStore │
//!                 └──────────────────────────────┘
//!
//!  register-key ─► KeyRegistrar ─► AgentKeyPublisher (backend PATCH)
//!                               └► AgentStore::save_keys
//! ```
//!
//! ## Security Notes
//!
//! - Private keys leave the process only towards the agent store.
//! - `AgentKeys` redacts the private key in its `Debug` output.

pub mod adapters;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{AgentStoreBackend, AgentStoreLocation, BasicAuth, FileAgentStore, HttpAgentStore};
pub use error::{AgentStoreError, PublishError, RegistrationError};
pub use ports::inbound::{AgentResolver, KeyRegistrationApi};
pub use ports::outbound::{AgentKeyPublisher, AgentStore};
pub use service::{AgentRegistry, KeyRegistrar};
