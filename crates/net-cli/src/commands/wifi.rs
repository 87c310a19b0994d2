//! Wireless apply command

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use sign_net_apply::WifiApplier;
use sign_net_core::WifiCredentials;

/// Wireless apply command: credentials arrive as one JSON object on
/// standard input so the PSK never appears in a process listing.
pub struct WifiApplyCommand {
    interface: String,
    wpa_conf: PathBuf,
    log_path: PathBuf,
    settle_delay: Option<Duration>,
}

impl WifiApplyCommand {
    pub fn new(interface: String, wpa_conf: PathBuf, log_path: PathBuf) -> Self {
        Self {
            interface,
            wpa_conf,
            log_path,
            settle_delay: None,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    pub async fn execute(&self) -> Result<()> {
        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .with_context(|| "Failed to read credentials from stdin")?;

        let creds = parse_credentials(&input)?;

        let mut applier = WifiApplier::new()
            .with_interface(self.interface.clone())
            .with_wpa_conf(self.wpa_conf.clone())
            .with_log_path(self.log_path.clone());
        if let Some(delay) = self.settle_delay {
            applier = applier.with_settle_delay(delay);
        }

        let outcome = applier
            .apply(&creds)
            .await
            .with_context(|| "Failed to apply wireless configuration")?;

        match &outcome.address {
            Some(address) => println!("{}", address),
            None => println!("OK"),
        }
        Ok(())
    }
}

fn parse_credentials(input: &str) -> Result<WifiCredentials> {
    serde_json::from_str::<WifiCredentials>(input)
        .with_context(|| "Invalid credentials JSON on stdin")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let creds = parse_credentials(r#"{"ssid": "cafe", "psk": "hunter22"}"#).unwrap();
        assert_eq!(creds.ssid, "cafe");
        assert_eq!(creds.psk.as_deref(), Some("hunter22"));

        let open = parse_credentials(r#"{"ssid": "cafe"}"#).unwrap();
        assert!(open.psk.is_none());
    }

    #[test]
    fn test_parse_credentials_rejects_garbage() {
        assert!(parse_credentials("not json").is_err());
        assert!(parse_credentials(r#"{"psk": "no-ssid"}"#).is_err());
    }
}
