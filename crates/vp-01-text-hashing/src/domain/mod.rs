//! # Domain Layer
//!
//! Pure text and key handling, no I/O.

pub mod errors;
pub mod hash_generator;
pub mod keys;
pub mod sanitizer;
pub mod shared_secret;
pub mod substitutions;
pub mod url_finder;
