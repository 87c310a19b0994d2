//! Wireless association

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use sign_net_config::WpaSupplicantConf;
use sign_net_core::{ApplyOutcome, Result, WifiCredentials};

use crate::applier::current_ipv4;
use crate::oplog;
use crate::runner::{best_effort, CommandRunner, SystemRunner};

/// Associates the wireless interface with a network by regenerating the
/// supplicant configuration and restarting the supplicant and DHCP client.
///
/// Same contract as the wired applier: a missing SSID is the only fatal
/// request error, backend commands are best-effort, and the log line is
/// the authoritative outcome. The PSK never appears in the log.
pub struct WifiApplier {
    runner: Arc<dyn CommandRunner>,
    interface: String,
    wpa_conf: PathBuf,
    log_path: PathBuf,
    settle_delay: Duration,
}

impl WifiApplier {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner::new()))
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            interface: "wlan0".to_string(),
            wpa_conf: PathBuf::from("/etc/wpa_supplicant/wpa_supplicant.conf"),
            log_path: PathBuf::from("/var/log/signnet.log"),
            // Association plus a DHCP handshake needs longer than wired
            settle_delay: Duration::from_secs(8),
        }
    }

    pub fn with_interface(mut self, interface: String) -> Self {
        self.interface = interface;
        self
    }

    pub fn with_wpa_conf(mut self, path: PathBuf) -> Self {
        self.wpa_conf = path;
        self
    }

    pub fn with_log_path(mut self, path: PathBuf) -> Self {
        self.log_path = path;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub async fn apply(&self, creds: &WifiCredentials) -> Result<ApplyOutcome> {
        let psk = creds.normalized_psk();
        let conf = WpaSupplicantConf::new(&creds.ssid, psk)?;
        let security = if psk.is_some() { "wpa-psk" } else { "open" };

        info!(
            "associating {} with \"{}\" ({})",
            self.interface, creds.ssid, security
        );

        if let Err(e) = conf.store(&self.wpa_conf).await {
            warn!("failed to write {}: {}", self.wpa_conf.display(), e);
        }

        let runner = self.runner.as_ref();
        best_effort(runner, "rfkill", &["unblock", "wifi"]).await;
        best_effort(runner, "systemctl", &["restart", "wpa_supplicant"]).await;
        best_effort(runner, "systemctl", &["restart", "dhcpcd"]).await;

        tokio::time::sleep(self.settle_delay).await;

        let address = current_ipv4(runner, &self.interface).await;
        let log_line = oplog::line(&format!(
            "apply-wifi iface={} ssid={} security={} result={}",
            self.interface,
            creds.ssid,
            security,
            address.as_deref().unwrap_or("none")
        ));
        oplog::append(&self.log_path, &log_line).await?;

        Ok(ApplyOutcome {
            success: address.is_some(),
            address,
            log_line,
        })
    }
}

impl Default for WifiApplier {
    fn default() -> Self {
        Self::new()
    }
}
