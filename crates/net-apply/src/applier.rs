//! Wired interface reconciliation

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use sign_net_core::error::ValidationError;
use sign_net_core::{AddressMode, ApplyOutcome, InterfaceConfig, Result};

use crate::backend::{Backend, BackendKind, DhcpcdBackend, NetworkManagerBackend};
use crate::oplog;
use crate::runner::{argv, CommandRunner, SystemRunner};

/// Fallback when no interface is given and no default route exists
const DEFAULT_INTERFACE: &str = "eth0";

/// Reconciles the live IPv4 state of one interface with a desired
/// configuration through whichever backend is active on the host.
///
/// Expected failures (missing interface, unreachable daemon) are swallowed;
/// the post-delay read-back is the sole success signal and the appended log
/// line is the authoritative outcome. Callers must not run two invocations
/// for the same interface concurrently: the dhcpcd.conf read-modify-write
/// is not serialized at this layer.
pub struct NetworkApplier {
    runner: Arc<dyn CommandRunner>,
    dhcpcd_conf: PathBuf,
    log_path: PathBuf,
    settle_delay: Duration,
}

impl NetworkApplier {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner::new()))
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            dhcpcd_conf: PathBuf::from("/etc/dhcpcd.conf"),
            log_path: PathBuf::from("/var/log/signnet.log"),
            settle_delay: Duration::from_secs(3),
        }
    }

    pub fn with_dhcpcd_conf(mut self, path: PathBuf) -> Self {
        self.dhcpcd_conf = path;
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

    /// Apply `cfg` to its target interface.
    ///
    /// Returns `Err` only for request validation failures and an unwritable
    /// log; everything else is recorded in the outcome and the log line.
    pub async fn apply(&self, cfg: &InterfaceConfig) -> Result<ApplyOutcome> {
        let interface = match cfg.interface.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.default_route_interface().await,
        };

        cfg.validate()?;

        let kind = BackendKind::detect(self.runner.as_ref()).await;
        info!("applying {} on {} via {:?}", cfg.mode, interface, kind);

        let backend: Box<dyn Backend> = match kind {
            BackendKind::NetworkManager => {
                Box::new(NetworkManagerBackend::new(self.runner.clone()))
            }
            BackendKind::Dhcpcd => Box::new(DhcpcdBackend::new(
                self.runner.clone(),
                self.dhcpcd_conf.clone(),
            )),
        };

        let applied = match cfg.mode {
            AddressMode::Dhcp => backend.apply_dhcp(&interface).await,
            AddressMode::Static => match (&cfg.address, &cfg.gateway) {
                (Some(address), Some(gateway)) => {
                    backend
                        .apply_static(&interface, address, *gateway, &cfg.dns_servers)
                        .await
                }
                // validate() rejects this before dispatch
                _ => {
                    return Err(ValidationError::MissingField {
                        field: "address".to_string(),
                    }
                    .into())
                }
            },
        };
        if let Err(e) = &applied {
            warn!("backend apply on {} failed: {}", interface, e);
        }

        // Fixed settle delay in place of active polling
        tokio::time::sleep(self.settle_delay).await;

        let address = current_ipv4(self.runner.as_ref(), &interface).await;
        let requested = match cfg.mode {
            AddressMode::Dhcp => "dhcp".to_string(),
            AddressMode::Static => cfg
                .address
                .map(|a| a.to_string())
                .unwrap_or_else(|| "static".to_string()),
        };

        let log_line = oplog::line(&format!(
            "apply iface={} mode={} requested={} result={}",
            interface,
            cfg.mode,
            requested,
            address.as_deref().unwrap_or("none")
        ));
        oplog::append(&self.log_path, &log_line).await?;

        Ok(ApplyOutcome {
            success: address.is_some(),
            address,
            log_line,
        })
    }

    /// Interface currently carrying the default route, or the fixed
    /// fallback name.
    async fn default_route_interface(&self) -> String {
        if let Ok(out) = self
            .runner
            .run("ip", argv(&["route", "show", "default"]))
            .await
        {
            if out.success {
                if let Some(name) = parse_default_route_dev(&out.stdout) {
                    return name;
                }
            }
        }
        debug!("no default route found; assuming {}", DEFAULT_INTERFACE);
        DEFAULT_INTERFACE.to_string()
    }
}

impl Default for NetworkApplier {
    fn default() -> Self {
        Self::new()
    }
}

/// Read back the interface's current IPv4 address after a settle delay.
pub(crate) async fn current_ipv4(runner: &dyn CommandRunner, interface: &str) -> Option<String> {
    match runner
        .run("ip", argv(&["-4", "addr", "show", "dev", interface]))
        .await
    {
        Ok(out) if out.success => parse_inet_address(&out.stdout),
        _ => None,
    }
}

fn parse_default_route_dev(stdout: &str) -> Option<String> {
    let mut tokens = stdout.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "dev" {
            return tokens.next().map(|s| s.to_string());
        }
    }
    None
}

fn parse_inet_address(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("inet "))
        .and_then(|rest| rest.split_whitespace().next())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_route_dev() {
        let stdout = "default via 192.168.0.1 dev eth0 proto dhcp src 192.168.0.23 metric 100\n";
        assert_eq!(parse_default_route_dev(stdout), Some("eth0".to_string()));

        assert_eq!(parse_default_route_dev(""), None);
        assert_eq!(parse_default_route_dev("default via 192.168.0.1"), None);
    }

    #[test]
    fn test_parse_inet_address() {
        let stdout = "\
2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc mq state UP group default qlen 1000
    inet 192.168.0.50/24 brd 192.168.0.255 scope global eth0
       valid_lft forever preferred_lft forever
";
        assert_eq!(
            parse_inet_address(stdout),
            Some("192.168.0.50/24".to_string())
        );
        assert_eq!(parse_inet_address("2: eth0: <NO-CARRIER>\n"), None);
    }

    #[test]
    fn test_parse_inet_address_first_wins() {
        let stdout = "    inet 10.0.0.2/24 scope global eth0\n    inet 10.0.0.3/24 scope global secondary eth0\n";
        assert_eq!(parse_inet_address(stdout), Some("10.0.0.2/24".to_string()));
    }
}
