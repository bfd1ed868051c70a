//! CLI command implementations.

pub mod common;
pub mod map;
pub mod resolve;
