//! wpa_supplicant.conf generation
//!
//! Unlike dhcpcd.conf, this file is wholly owned by the helper and is
//! regenerated from scratch on every wireless apply.

use std::path::Path;

use sign_net_core::error::ValidationError;
use sign_net_core::Result;

/// Generated supplicant configuration with a single network block
#[derive(Debug, Clone)]
pub struct WpaSupplicantConf {
    ssid: String,
    psk: Option<String>,
}

impl WpaSupplicantConf {
    /// Build a configuration for one network.
    ///
    /// SSID and PSK are embedded as quoted literals, so values containing
    /// a double quote or a newline are rejected rather than escaped.
    pub fn new(ssid: &str, psk: Option<&str>) -> std::result::Result<Self, ValidationError> {
        if ssid.is_empty() {
            return Err(ValidationError::MissingField {
                field: "ssid".to_string(),
            });
        }
        Self::check_quotable("ssid", ssid)?;
        if let Some(psk) = psk {
            Self::check_quotable("psk", psk)?;
        }

        Ok(Self {
            ssid: ssid.to_string(),
            psk: psk.map(|p| p.to_string()),
        })
    }

    fn check_quotable(field: &str, value: &str) -> std::result::Result<(), ValidationError> {
        if value.contains('"') || value.contains('\n') {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// Render the full file content.
    pub fn render(&self) -> String {
        let mut output = String::new();
        output.push_str("ctrl_interface=DIR=/var/run/wpa_supplicant GROUP=netdev\n");
        output.push_str("update_config=1\n");
        output.push_str("country=US\n");
        output.push('\n');
        output.push_str("network={\n");
        output.push_str(&format!("    ssid=\"{}\"\n", self.ssid));
        match &self.psk {
            Some(psk) => {
                output.push_str(&format!("    psk=\"{}\"\n", psk));
                output.push_str("    key_mgmt=WPA-PSK\n");
            }
            None => {
                output.push_str("    key_mgmt=NONE\n");
            }
        }
        output.push_str("}\n");
        output
    }

    /// Write the rendered configuration atomically.
    pub async fn store(&self, path: &Path) -> Result<()> {
        crate::atomic::store(path, &self.render()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_network_block() {
        let conf = WpaSupplicantConf::new("cafe", None).unwrap();
        let rendered = conf.render();

        assert!(rendered.contains("ssid=\"cafe\""));
        assert!(rendered.contains("key_mgmt=NONE"));
        assert!(!rendered.contains("psk"));
    }

    #[test]
    fn test_psk_network_block() {
        let conf = WpaSupplicantConf::new("cafe", Some("hunter22")).unwrap();
        let rendered = conf.render();

        assert!(rendered.contains("ssid=\"cafe\""));
        assert!(rendered.contains("psk=\"hunter22\""));
        assert!(rendered.contains("key_mgmt=WPA-PSK"));
        assert!(!rendered.contains("key_mgmt=NONE"));
    }

    #[test]
    fn test_header_present() {
        let rendered = WpaSupplicantConf::new("cafe", None).unwrap().render();
        assert!(rendered.starts_with("ctrl_interface=DIR=/var/run/wpa_supplicant GROUP=netdev\n"));
        assert!(rendered.contains("update_config=1"));
        assert!(rendered.contains("country=US"));
    }

    #[test]
    fn test_rejects_unquotable_values() {
        assert!(WpaSupplicantConf::new("", None).is_err());
        assert!(WpaSupplicantConf::new("has\"quote", None).is_err());
        assert!(WpaSupplicantConf::new("cafe", Some("line\nbreak")).is_err());
    }

    #[tokio::test]
    async fn test_store_writes_rendered_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("wpa_supplicant.conf");

        let conf = WpaSupplicantConf::new("cafe", Some("hunter22")).unwrap();
        conf.store(&path).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, conf.render());
    }
}
