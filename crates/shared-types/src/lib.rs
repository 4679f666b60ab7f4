//! # Shared Types Crate
//!
//! Domain entities passed between the proxy crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: agent records, recipients and hash codes are
//!   defined once here and reused by every crate.
//! - **Secrets stay opaque**: private key material is never printed by
//!   `Debug` and is wiped from memory when decoded copies are dropped.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
