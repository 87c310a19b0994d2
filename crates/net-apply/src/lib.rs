//! Sign controller network apply
//!
//! Live-state reconciliation for the sign's interfaces: backend dispatch
//! between NetworkManager and dhcpcd, wired and wireless appliers, and the
//! wireless scanner.

pub mod applier;
pub mod backend;
pub mod oplog;
pub mod runner;
pub mod scan;
pub mod wifi;


pub use applier::NetworkApplier;
pub use backend::{Backend, BackendKind, DhcpcdBackend, NetworkManagerBackend};
pub use runner::{argv, CmdOutput, CommandRunner, SystemRunner};
pub use scan::WifiScanner;
pub use wifi::WifiApplier;
