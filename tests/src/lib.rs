//! # Verified-SMS Proxy Test Suite
//!
//! Cross-crate tests that need more than one subsystem.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── support.rs        # Local doubles: verification service, Kannel
//! │   └── integration/
//! │       ├── dispatch_flow.rs      # gate + real hashing, in-memory ports
//! │       ├── registration_flow.rs  # key registration → store → dispatch
//! │       └── http_flow.rs          # full proxy over HTTP
//! └── benches/
//!     └── proxy_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vp-tests
//! cargo bench -p vp-tests
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
