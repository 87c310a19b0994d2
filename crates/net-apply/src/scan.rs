//! Wireless scan reduction
//!
//! Reduces the textual dump of `iw dev <iface> scan` into the record list
//! the web GUI renders as a pick list.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::warn;
use regex::Regex;

use sign_net_core::{channel_for_frequency, Result, WifiNetwork};

use crate::runner::{argv, CommandRunner, SystemRunner};

pub struct WifiScanner {
    runner: Arc<dyn CommandRunner>,
}

impl WifiScanner {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner::new()))
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Query the radio for nearby networks.
    ///
    /// A failed or timed-out scan is an expected condition (radio blocked,
    /// interface busy) and yields an empty list rather than an error.
    pub async fn scan(&self, interface: &str) -> Result<Vec<WifiNetwork>> {
        match self
            .runner
            .run("iw", argv(&["dev", interface, "scan"]))
            .await
        {
            Ok(out) if out.success => Ok(parse_scan(&out.stdout)),
            Ok(out) => {
                warn!("scan on {} failed: {}", interface, out.stderr.trim());
                Ok(Vec::new())
            }
            Err(e) => {
                warn!("scan on {} failed: {}", interface, e);
                Ok(Vec::new())
            }
        }
    }
}

impl Default for WifiScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct PartialBss {
    ssid: Option<String>,
    freq: Option<u32>,
    signal: Option<f64>,
    secure: bool,
}

impl PartialBss {
    fn finish(self) -> Option<WifiNetwork> {
        let ssid = self.ssid?;
        // Hidden networks are not actionable in a pick list
        if ssid.is_empty() || ssid.contains("\\x00") {
            return None;
        }
        let freq = self.freq?;

        Some(WifiNetwork {
            ssid,
            signal: self.signal?,
            freq,
            chan: channel_for_frequency(freq),
            secure: self.secure,
        })
    }
}

/// Reduce a scan dump to one record per SSID, strongest signal first.
pub fn parse_scan(dump: &str) -> Vec<WifiNetwork> {
    let freq_re = Regex::new(r"^\s*freq:\s*([0-9]+)").unwrap();
    let signal_re = Regex::new(r"^\s*signal:\s*(-?[0-9]+(?:\.[0-9]+)?)").unwrap();
    let ssid_re = Regex::new(r"^\s*SSID:\s?(.*)$").unwrap();
    let secure_re = Regex::new(r"^\s*(RSN|WPA):").unwrap();

    let mut networks: BTreeMap<String, WifiNetwork> = BTreeMap::new();
    let mut current: Option<PartialBss> = None;

    let commit = |bss: Option<PartialBss>, networks: &mut BTreeMap<String, WifiNetwork>| {
        if let Some(network) = bss.and_then(PartialBss::finish) {
            // Duplicate SSIDs (multiple BSSs) collapse to the strongest
            match networks.get(&network.ssid) {
                Some(existing) if existing.signal >= network.signal => {}
                _ => {
                    networks.insert(network.ssid.clone(), network);
                }
            }
        }
    };

    for line in dump.lines() {
        if line.starts_with("BSS ") {
            commit(current.take(), &mut networks);
            current = Some(PartialBss::default());
            continue;
        }

        let Some(bss) = current.as_mut() else {
            continue;
        };

        if let Some(caps) = freq_re.captures(line) {
            bss.freq = caps[1].parse().ok();
        } else if let Some(caps) = signal_re.captures(line) {
            bss.signal = caps[1].parse().ok();
        } else if let Some(caps) = ssid_re.captures(line) {
            bss.ssid = Some(caps[1].to_string());
        } else if secure_re.is_match(line) {
            bss.secure = true;
        }
    }
    commit(current.take(), &mut networks);

    let mut result: Vec<WifiNetwork> = networks.into_values().collect();
    result.sort_by(|a, b| {
        b.signal
            .partial_cmp(&a.signal)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    result
}
