//! Backend dispatch for the two mutually exclusive network managers
//!
//! A host runs either NetworkManager or the legacy dhcpcd client, never
//! both (mutual exclusion is enforced at install time). Which one is
//! active is probed per call, so a host that switches managers keeps
//! working without reconfiguring this tool.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use sign_net_config::DhcpcdConf;
use sign_net_core::{Ipv4Cidr, Result};

use crate::runner::{argv, best_effort, CommandRunner};

/// Which backend owns IP configuration on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    NetworkManager,
    Dhcpcd,
}

impl BackendKind {
    /// Liveness probe: NetworkManager wins when its unit is active,
    /// anything else falls through to dhcpcd.
    pub async fn detect(runner: &dyn CommandRunner) -> Self {
        match runner
            .run("systemctl", argv(&["is-active", "NetworkManager"]))
            .await
        {
            Ok(out) if out.success && out.stdout.trim() == "active" => {
                BackendKind::NetworkManager
            }
            _ => BackendKind::Dhcpcd,
        }
    }
}

/// Capability set both backends implement.
///
/// The DHCP path deliberately takes no address parameters: backend
/// selection can never consult a stale static assignment.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn apply_dhcp(&self, interface: &str) -> Result<()>;

    async fn apply_static(
        &self,
        interface: &str,
        address: &Ipv4Cidr,
        gateway: Ipv4Addr,
        dns: &[Ipv4Addr],
    ) -> Result<()>;
}

/// Declarative backend driven through nmcli connection profiles
pub struct NetworkManagerBackend {
    runner: Arc<dyn CommandRunner>,
}

impl NetworkManagerBackend {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn profile_name(interface: &str) -> String {
        format!("signnet-{}", interface)
    }

    /// Ensure exactly one connection profile exists for the interface:
    /// delete strays bound to the device, create the canonical profile if
    /// it is missing.
    async fn ensure_profile(&self, interface: &str) {
        let profile = Self::profile_name(interface);

        match self
            .runner
            .run("nmcli", argv(&["-t", "-f", "NAME,DEVICE", "connection", "show"]))
            .await
        {
            Ok(out) if out.success => {
                let mut have_canonical = false;
                for line in out.stdout.lines() {
                    let mut parts = line.splitn(2, ':');
                    let name = parts.next().unwrap_or("");
                    let device = parts.next().unwrap_or("");

                    if name == profile {
                        have_canonical = true;
                    } else if device == interface {
                        debug!("deleting stray profile {} on {}", name, interface);
                        best_effort(
                            self.runner.as_ref(),
                            "nmcli",
                            &["connection", "delete", name],
                        )
                        .await;
                    }
                }
                if !have_canonical {
                    best_effort(
                        self.runner.as_ref(),
                        "nmcli",
                        &[
                            "connection", "add", "type", "ethernet", "ifname", interface,
                            "con-name", &profile,
                        ],
                    )
                    .await;
                }
            }
            _ => warn!(
                "could not list connection profiles; continuing with {}",
                profile
            ),
        }
    }

    /// Flush stale kernel addresses and bounce the profile to force
    /// re-acquisition.
    async fn bounce(&self, interface: &str) {
        let profile = Self::profile_name(interface);
        let runner = self.runner.as_ref();

        best_effort(runner, "ip", &["addr", "flush", "dev", interface]).await;
        best_effort(runner, "nmcli", &["connection", "down", &profile]).await;
        best_effort(runner, "nmcli", &["connection", "up", &profile]).await;
    }
}

#[async_trait]
impl Backend for NetworkManagerBackend {
    async fn apply_dhcp(&self, interface: &str) -> Result<()> {
        self.ensure_profile(interface).await;

        let profile = Self::profile_name(interface);
        // Empty property values clear any previous static assignment
        best_effort(
            self.runner.as_ref(),
            "nmcli",
            &[
                "connection",
                "modify",
                &profile,
                "ipv4.method",
                "auto",
                "ipv4.addresses",
                "",
                "ipv4.gateway",
                "",
                "ipv4.dns",
                "",
            ],
        )
        .await;

        self.bounce(interface).await;
        Ok(())
    }

    async fn apply_static(
        &self,
        interface: &str,
        address: &Ipv4Cidr,
        gateway: Ipv4Addr,
        dns: &[Ipv4Addr],
    ) -> Result<()> {
        self.ensure_profile(interface).await;

        let profile = Self::profile_name(interface);
        let address = address.to_string();
        let gateway = gateway.to_string();
        // nmcli takes its multi-value property comma-joined; an empty list
        // passes "" to clear a previous override
        let dns = dns
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",");

        best_effort(
            self.runner.as_ref(),
            "nmcli",
            &[
                "connection",
                "modify",
                &profile,
                "ipv4.method",
                "manual",
                "ipv4.addresses",
                &address,
                "ipv4.gateway",
                &gateway,
                "ipv4.dns",
                &dns,
            ],
        )
        .await;

        self.bounce(interface).await;
        Ok(())
    }
}

/// Legacy backend: managed block in dhcpcd.conf plus a daemon restart
pub struct DhcpcdBackend {
    runner: Arc<dyn CommandRunner>,
    config_path: PathBuf,
}

impl DhcpcdBackend {
    pub fn new(runner: Arc<dyn CommandRunner>, config_path: PathBuf) -> Self {
        Self {
            runner,
            config_path,
        }
    }

    async fn flush_and_restart(&self, interface: &str) {
        let runner = self.runner.as_ref();
        best_effort(runner, "ip", &["addr", "flush", "dev", interface]).await;
        best_effort(runner, "systemctl", &["restart", "dhcpcd"]).await;
    }
}

#[async_trait]
impl Backend for DhcpcdBackend {
    async fn apply_dhcp(&self, interface: &str) -> Result<()> {
        let mut conf = DhcpcdConf::load(&self.config_path).await?;
        conf.clear(interface);
        conf.store(&self.config_path).await?;

        self.flush_and_restart(interface).await;
        Ok(())
    }

    async fn apply_static(
        &self,
        interface: &str,
        address: &Ipv4Cidr,
        gateway: Ipv4Addr,
        dns: &[Ipv4Addr],
    ) -> Result<()> {
        let mut conf = DhcpcdConf::load(&self.config_path).await?;
        conf.set_static(interface, address, gateway, dns);
        conf.store(&self.config_path).await?;

        self.flush_and_restart(interface).await;
        Ok(())
    }
}
