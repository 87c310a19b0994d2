//! Sign controller network configuration
//!
//! Typed models of the two configuration files this tool owns: the managed
//! block inside the system dhcpcd.conf, and the wpa_supplicant.conf it
//! generates from scratch.

pub mod atomic;
pub mod dhcpcd;
pub mod wpa;

pub use dhcpcd::DhcpcdConf;
pub use wpa::WpaSupplicantConf;
