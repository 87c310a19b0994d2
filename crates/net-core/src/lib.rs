//! Sign controller network core
//!
//! Shared types and error taxonomy for the network reconfiguration helper

pub mod error;
pub mod types;

pub use error::NetError;
pub use types::*;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, NetError>;
