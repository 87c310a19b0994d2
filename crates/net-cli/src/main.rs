//! Sign controller network CLI (signnet)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use signnet::commands::{ApplyArgs, ApplyCommand, ScanCommand, WifiApplyCommand};

#[derive(Parser)]
#[command(name = "signnet")]
#[command(about = "LED sign controller network reconfiguration helper")]
#[command(version)]
#[command(long_about = "
LED sign controller network reconfiguration helper

Invoked by the sign's web GUI to reconcile live network state: wired
DHCP/static configuration through whichever backend is active on the host
(NetworkManager or dhcpcd), wireless association through wpa_supplicant,
and a wireless scan reduced to JSON.

Every apply appends one line to the operational log; the log, not the exit
status, is the authoritative record of what happened. The caller must not
run two invocations for the same interface concurrently.

Examples:
  signnet apply eth0 dhcp                                  # back to DHCP
  signnet apply eth0 static 192.168.0.50 24 192.168.0.1 \\
      1.1.1.1 8.8.8.8                                      # static + DNS
  signnet apply \"\" dhcp                                    # default-route iface
  echo '{\"ssid\":\"cafe\",\"psk\":\"secret\"}' | signnet wifi-apply
  signnet wifi-scan wlan0
")]
struct Cli {
    /// Enable verbose output
    #[arg(short = 'V', long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a wired IPv4 configuration
    Apply {
        /// Target interface; empty string means the interface currently
        /// carrying the default route
        interface: String,

        /// Address mode; anything other than "static" is treated as dhcp
        mode: String,

        /// IPv4 address (static mode only)
        address: Option<String>,

        /// Prefix length (static mode only)
        prefix_length: Option<u8>,

        /// Gateway address (static mode only)
        gateway: Option<String>,

        /// DNS servers, in preference order
        dns: Vec<String>,

        /// dhcpcd configuration file (legacy backend)
        #[arg(long, default_value = "/etc/dhcpcd.conf")]
        config: PathBuf,

        /// Operational log file
        #[arg(long, default_value = "/var/log/signnet.log")]
        log: PathBuf,

        /// Seconds to wait before reading back the address
        #[arg(long, default_value_t = 3)]
        settle: u64,
    },

    /// Associate the wireless interface; reads {"ssid", "psk"} JSON on stdin
    WifiApply {
        /// Wireless interface
        #[arg(short, long, default_value = "wlan0")]
        interface: String,

        /// Generated supplicant configuration file
        #[arg(long, default_value = "/etc/wpa_supplicant/wpa_supplicant.conf")]
        wpa_config: PathBuf,

        /// Operational log file
        #[arg(long, default_value = "/var/log/signnet.log")]
        log: PathBuf,

        /// Seconds to wait before reading back the address
        #[arg(long, default_value_t = 8)]
        settle: u64,
    },

    /// Scan for nearby wireless networks and print them as JSON
    WifiScan {
        /// Interface to scan on
        #[arg(default_value = "wlan0")]
        interface: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Apply {
            interface,
            mode,
            address,
            prefix_length,
            gateway,
            dns,
            config,
            log,
            settle,
        } => {
            let cmd = ApplyCommand::new(config, log)
                .with_settle_delay(Duration::from_secs(settle));
            cmd.execute(ApplyArgs {
                interface,
                mode,
                address,
                prefix_length,
                gateway,
                dns,
            })
            .await
        }

        Commands::WifiApply {
            interface,
            wpa_config,
            log,
            settle,
        } => {
            let cmd = WifiApplyCommand::new(interface, wpa_config, log)
                .with_settle_delay(Duration::from_secs(settle));
            cmd.execute().await
        }

        Commands::WifiScan { interface } => {
            let cmd = ScanCommand::new(interface);
            cmd.execute().await
        }
    };

    match result {
        Ok(()) => {
            log::info!("Command completed successfully");
            std::process::exit(0);
        }
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);

                if cli.verbose || cli.debug {
                    let mut source = e.source();
                    while let Some(err) = source {
                        eprintln!("  Caused by: {}", err);
                        source = err.source();
                    }
                }
            }
            std::process::exit(1);
        }
    }
}
