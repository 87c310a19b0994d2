//! Core data types for the network reconfiguration helper

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// IPv4 address assignment mode for an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressMode {
    Dhcp,
    Static,
}

impl From<&str> for AddressMode {
    /// Any token other than the literal `static` coerces to DHCP.
    ///
    /// Fail-open policy: a malformed request must not be able to strand a
    /// headless device offline with a half-applied static assignment.
    fn from(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("static") {
            AddressMode::Static
        } else {
            AddressMode::Dhcp
        }
    }
}

impl fmt::Display for AddressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressMode::Dhcp => write!(f, "dhcp"),
            AddressMode::Static => write!(f, "static"),
        }
    }
}

/// IPv4 address with prefix length, e.g. `192.168.0.50/24`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Cidr {
    pub addr: Ipv4Addr,
    pub prefix_len: u8,
}

impl Ipv4Cidr {
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, ValidationError> {
        if prefix_len > 32 {
            return Err(ValidationError::InvalidValue {
                field: "prefix_len".to_string(),
                value: prefix_len.to_string(),
            });
        }
        Ok(Self { addr, prefix_len })
    }
}

impl FromStr for Ipv4Cidr {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidValue {
            field: "address".to_string(),
            value: s.to_string(),
        };

        let (addr_part, prefix_part) = s.split_once('/').ok_or_else(invalid)?;
        let addr = addr_part.parse::<Ipv4Addr>().map_err(|_| invalid())?;
        let prefix_len = prefix_part.parse::<u8>().map_err(|_| invalid())?;

        Ipv4Cidr::new(addr, prefix_len).map_err(|_| invalid())
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

/// Desired IPv4 configuration for one interface
///
/// `address` and `gateway` are required when `mode` is static and ignored
/// for DHCP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Target interface; `None` means "the interface carrying the default
    /// route", resolved at apply time.
    pub interface: Option<String>,
    pub mode: AddressMode,
    pub address: Option<Ipv4Cidr>,
    pub gateway: Option<Ipv4Addr>,
    pub dns_servers: Vec<Ipv4Addr>,
}

impl InterfaceConfig {
    /// Shorthand for a DHCP request on an optional interface.
    pub fn dhcp(interface: Option<String>) -> Self {
        Self {
            interface,
            mode: AddressMode::Dhcp,
            address: None,
            gateway: None,
            dns_servers: Vec::new(),
        }
    }

    /// Check the static-mode invariant before dispatching to a backend.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mode == AddressMode::Static {
            if self.address.is_none() {
                return Err(ValidationError::MissingField {
                    field: "address".to_string(),
                });
            }
            if self.gateway.is_none() {
                return Err(ValidationError::MissingField {
                    field: "gateway".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Outcome of one apply invocation
///
/// Constructed fresh per invocation and never persisted beyond the
/// operational log; the log line is the authoritative outcome channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Whether the post-delay read-back produced an address
    pub success: bool,
    /// Resulting IPv4 address with prefix, if any
    pub address: Option<String>,
    /// The line appended to the operational log
    pub log_line: String,
}

/// Wireless association request, delivered as JSON on standard input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WifiCredentials {
    pub ssid: String,
    #[serde(default)]
    pub psk: Option<String>,
}

impl WifiCredentials {
    /// PSK with the empty string treated as absent (open network).
    pub fn normalized_psk(&self) -> Option<&str> {
        self.psk.as_deref().filter(|p| !p.is_empty())
    }
}

/// One nearby network from a wireless scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiNetwork {
    pub ssid: String,
    /// Signal strength in dBm
    pub signal: f64,
    /// Frequency in MHz
    pub freq: u32,
    /// Channel derived from the frequency, 0 when outside known bands
    pub chan: u32,
    /// Whether RSN/WPA information elements were present
    pub secure: bool,
}

/// Map a frequency in MHz to its Wi-Fi channel number.
///
/// 2.4 GHz channels 1-13 sit at 2412-2472 MHz in 5 MHz steps, channel 14
/// at 2484 MHz, and the 5 GHz band runs in 5 MHz steps from 5000 MHz.
/// Frequencies outside the recognized bands map to 0.
pub fn channel_for_frequency(mhz: u32) -> u32 {
    match mhz {
        2412..=2472 if (mhz - 2407) % 5 == 0 => (mhz - 2407) / 5,
        2484 => 14,
        5180..=5885 => (mhz - 5000) / 5,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_coercion_fails_open_to_dhcp() {
        assert_eq!(AddressMode::from("static"), AddressMode::Static);
        assert_eq!(AddressMode::from("Static"), AddressMode::Static);
        assert_eq!(AddressMode::from("dhcp"), AddressMode::Dhcp);
        assert_eq!(AddressMode::from("garbage"), AddressMode::Dhcp);
        assert_eq!(AddressMode::from(""), AddressMode::Dhcp);
    }

    #[test]
    fn test_cidr_parsing() {
        let cidr: Ipv4Cidr = "192.168.0.50/24".parse().unwrap();
        assert_eq!(cidr.addr, Ipv4Addr::new(192, 168, 0, 50));
        assert_eq!(cidr.prefix_len, 24);
        assert_eq!(cidr.to_string(), "192.168.0.50/24");

        assert!("192.168.0.50".parse::<Ipv4Cidr>().is_err());
        assert!("192.168.0.50/33".parse::<Ipv4Cidr>().is_err());
        assert!("not-an-ip/24".parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn test_static_validation() {
        let mut cfg = InterfaceConfig {
            interface: Some("eth0".to_string()),
            mode: AddressMode::Static,
            address: Some("192.168.0.50/24".parse().unwrap()),
            gateway: Some("192.168.0.1".parse().unwrap()),
            dns_servers: Vec::new(),
        };
        assert!(cfg.validate().is_ok());

        cfg.gateway = None;
        assert!(cfg.validate().is_err());

        // DHCP never requires address fields
        let dhcp = InterfaceConfig::dhcp(Some("eth0".to_string()));
        assert!(dhcp.validate().is_ok());
    }

    #[test]
    fn test_channel_for_frequency() {
        assert_eq!(channel_for_frequency(2412), 1);
        assert_eq!(channel_for_frequency(2437), 6);
        assert_eq!(channel_for_frequency(2472), 13);
        assert_eq!(channel_for_frequency(2484), 14);
        assert_eq!(channel_for_frequency(5180), 36);
        assert_eq!(channel_for_frequency(5745), 149);
        assert_eq!(channel_for_frequency(2400), 0);
        assert_eq!(channel_for_frequency(900), 0);
    }

    #[test]
    fn test_wifi_credentials_psk_normalization() {
        let open: WifiCredentials = serde_json::from_str(r#"{"ssid": "cafe"}"#).unwrap();
        assert_eq!(open.normalized_psk(), None);

        let empty: WifiCredentials =
            serde_json::from_str(r#"{"ssid": "cafe", "psk": ""}"#).unwrap();
        assert_eq!(empty.normalized_psk(), None);

        let secured: WifiCredentials =
            serde_json::from_str(r#"{"ssid": "cafe", "psk": "hunter22"}"#).unwrap();
        assert_eq!(secured.normalized_psk(), Some("hunter22"));
    }
}
