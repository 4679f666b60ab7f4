//! # Domain Layer

pub mod coding;
pub mod errors;
pub mod gsm7;
pub mod segmenter;
pub mod udh;
