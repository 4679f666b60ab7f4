//! # Port Adapters
//!
//! Connect the dispatch gate and the key registrar to the concrete agent
//! store, verification client and SMS gateway.

pub mod backend;
pub mod directory;
pub mod gateway;

pub use backend::VerificationBackendAdapter;
pub use directory::RegistryDirectory;
pub use gateway::{GatewayError, KannelGateway, PartRelay};
