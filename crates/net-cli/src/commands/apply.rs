//! Wired apply command

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use sign_net_apply::NetworkApplier;
use sign_net_core::{AddressMode, InterfaceConfig, Ipv4Cidr};

/// Positional arguments of the wired invocation contract
pub struct ApplyArgs {
    pub interface: String,
    pub mode: String,
    pub address: Option<String>,
    pub prefix_length: Option<u8>,
    pub gateway: Option<String>,
    pub dns: Vec<String>,
}

/// Wired apply command implementation
pub struct ApplyCommand {
    dhcpcd_conf: PathBuf,
    log_path: PathBuf,
    settle_delay: Option<Duration>,
}

impl ApplyCommand {
    pub fn new(dhcpcd_conf: PathBuf, log_path: PathBuf) -> Self {
        Self {
            dhcpcd_conf,
            log_path,
            settle_delay: None,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    pub async fn execute(&self, args: ApplyArgs) -> Result<()> {
        let cfg = build_config(&args)?;

        let mut applier = NetworkApplier::new()
            .with_dhcpcd_conf(self.dhcpcd_conf.clone())
            .with_log_path(self.log_path.clone());
        if let Some(delay) = self.settle_delay {
            applier = applier.with_settle_delay(delay);
        }

        let outcome = applier
            .apply(&cfg)
            .await
            .with_context(|| "Failed to apply interface configuration")?;

        // Output contract: the resulting address for a static apply that
        // produced one, the literal OK otherwise
        match (cfg.mode, &outcome.address) {
            (AddressMode::Static, Some(address)) => println!("{}", address),
            _ => println!("OK"),
        }
        Ok(())
    }
}

/// Build the typed request from positional arguments.
///
/// The DHCP path never looks at the address arguments, so garbage in them
/// cannot fail a fall-back-to-DHCP request.
fn build_config(args: &ApplyArgs) -> Result<InterfaceConfig> {
    let interface = if args.interface.is_empty() {
        None
    } else {
        Some(args.interface.clone())
    };

    let cfg = match AddressMode::from(args.mode.as_str()) {
        AddressMode::Dhcp => InterfaceConfig::dhcp(interface),
        AddressMode::Static => {
            let address = match (&args.address, args.prefix_length) {
                (Some(address), Some(len)) => Some(
                    format!("{}/{}", address, len)
                        .parse::<Ipv4Cidr>()
                        .with_context(|| format!("Invalid address: {}/{}", address, len))?,
                ),
                _ => None,
            };
            let gateway = args
                .gateway
                .as_deref()
                .map(|g| g.parse::<Ipv4Addr>())
                .transpose()
                .with_context(|| "Invalid gateway address")?;
            let dns_servers = args
                .dns
                .iter()
                .map(|d| {
                    d.parse::<Ipv4Addr>()
                        .with_context(|| format!("Invalid DNS server: {}", d))
                })
                .collect::<Result<Vec<_>>>()?;

            InterfaceConfig {
                interface,
                mode: AddressMode::Static,
                address,
                gateway,
                dns_servers,
            }
        }
    };

    Ok(cfg)
}
