//! Domain types of the dispatch gate.

pub mod errors;
pub mod message;
pub mod outcome;
pub mod policy;
