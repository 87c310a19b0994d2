//! CLI commands

pub mod apply;
pub mod scan;
pub mod wifi;

pub use apply::{ApplyArgs, ApplyCommand};
pub use scan::ScanCommand;
pub use wifi::WifiApplyCommand;
