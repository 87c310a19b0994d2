//! dhcpcd.conf managed block model
//!
//! The system dhcpcd.conf stays under the administrator's control; this tool
//! only owns marker-delimited blocks, one per interface. Everything outside
//! the markers is preserved verbatim, so hand edits survive reconfiguration.

use std::net::Ipv4Addr;
use std::path::Path;

use log::debug;

use sign_net_core::{Ipv4Cidr, Result};

const BEGIN_PREFIX: &str = "# BEGIN signnet ";
const END_PREFIX: &str = "# END signnet ";

/// Parsed dhcpcd.conf: unmanaged content plus managed per-interface blocks
#[derive(Debug, Clone, Default)]
pub struct DhcpcdConf {
    /// Lines outside any managed block, in original order
    unmanaged: Vec<String>,
    /// Managed blocks, at most one per interface
    blocks: Vec<ManagedBlock>,
}

#[derive(Debug, Clone)]
struct ManagedBlock {
    interface: String,
    lines: Vec<String>,
}

impl DhcpcdConf {
    /// Parse file content into unmanaged lines and managed blocks.
    ///
    /// A block missing its end marker runs to end of file; duplicate blocks
    /// for the same interface collapse to the last one seen.
    pub fn parse(content: &str) -> Self {
        let mut conf = DhcpcdConf::default();
        let mut current: Option<ManagedBlock> = None;

        for line in content.lines() {
            if let Some(iface) = line.strip_prefix(BEGIN_PREFIX) {
                if let Some(block) = current.take() {
                    conf.replace_block(block);
                }
                current = Some(ManagedBlock {
                    interface: iface.trim().to_string(),
                    lines: Vec::new(),
                });
            } else if line.starts_with(END_PREFIX) {
                if let Some(block) = current.take() {
                    conf.replace_block(block);
                }
            } else if let Some(block) = current.as_mut() {
                block.lines.push(line.to_string());
            } else {
                conf.unmanaged.push(line.to_string());
            }
        }

        if let Some(block) = current.take() {
            conf.replace_block(block);
        }

        conf
    }

    /// Load from `path`; a missing file parses as empty.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Render and write back atomically.
    pub async fn store(&self, path: &Path) -> Result<()> {
        crate::atomic::store(path, &self.render()).await
    }

    /// Replace the managed block for `interface` with a static assignment.
    ///
    /// The DNS line is omitted entirely when the list is empty; dhcpcd then
    /// falls back to lease-provided DNS instead of a stale override.
    pub fn set_static(
        &mut self,
        interface: &str,
        address: &Ipv4Cidr,
        gateway: Ipv4Addr,
        dns: &[Ipv4Addr],
    ) {
        let mut lines = vec![
            format!("interface {}", interface),
            format!("static ip_address={}", address),
            format!("static routers={}", gateway),
        ];
        if !dns.is_empty() {
            let joined = dns
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(format!("static domain_name_servers={}", joined));
        }

        debug!("setting static block for {}: {}", interface, address);
        self.replace_block(ManagedBlock {
            interface: interface.to_string(),
            lines,
        });
    }

    /// Remove the managed block for `interface`, returning the interface to
    /// plain DHCP.
    pub fn clear(&mut self, interface: &str) {
        debug!("clearing managed block for {}", interface);
        self.blocks.retain(|b| b.interface != interface);
    }

    /// Whether a managed block exists for `interface`.
    pub fn contains(&self, interface: &str) -> bool {
        self.blocks.iter().any(|b| b.interface == interface)
    }

    /// Render the file: unmanaged content first, managed blocks appended.
    pub fn render(&self) -> String {
        let mut output = String::new();

        for line in &self.unmanaged {
            output.push_str(line);
            output.push('\n');
        }

        for block in &self.blocks {
            output.push_str(BEGIN_PREFIX);
            output.push_str(&block.interface);
            output.push('\n');
            for line in &block.lines {
                output.push_str(line);
                output.push('\n');
            }
            output.push_str(END_PREFIX);
            output.push_str(&block.interface);
            output.push('\n');
        }

        output
    }

    fn replace_block(&mut self, block: ManagedBlock) {
        self.blocks.retain(|b| b.interface != block.interface);
        self.blocks.push(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_cfg() -> (Ipv4Cidr, Ipv4Addr, Vec<Ipv4Addr>) {
        (
            "192.168.0.50/24".parse().unwrap(),
            "192.168.0.1".parse().unwrap(),
            vec!["1.1.1.1".parse().unwrap(), "8.8.8.8".parse().unwrap()],
        )
    }

    fn begin_marker_count(rendered: &str, iface: &str) -> usize {
        rendered
            .lines()
            .filter(|l| *l == format!("# BEGIN signnet {}", iface))
            .count()
    }

    #[test]
    fn test_static_block_contents() {
        let (addr, gw, dns) = static_cfg();
        let mut conf = DhcpcdConf::default();
        conf.set_static("eth0", &addr, gw, &dns);

        let rendered = conf.render();
        assert!(rendered.contains("interface eth0"));
        assert!(rendered.contains("static ip_address=192.168.0.50/24"));
        assert!(rendered.contains("static routers=192.168.0.1"));
        assert!(rendered.contains("static domain_name_servers=1.1.1.1 8.8.8.8"));
    }

    #[test]
    fn test_empty_dns_clears_previous_override() {
        let (addr, gw, dns) = static_cfg();
        let mut conf = DhcpcdConf::default();
        conf.set_static("eth0", &addr, gw, &dns);
        assert!(conf.render().contains("domain_name_servers"));

        conf.set_static("eth0", &addr, gw, &[]);
        let rendered = conf.render();
        assert!(!rendered.contains("domain_name_servers"));
        assert_eq!(begin_marker_count(&rendered, "eth0"), 1);
    }

    #[test]
    fn test_repeated_apply_is_idempotent() {
        let (addr, gw, dns) = static_cfg();
        let mut conf = DhcpcdConf::default();

        for _ in 0..5 {
            conf.set_static("eth0", &addr, gw, &dns);
        }
        assert_eq!(begin_marker_count(&conf.render(), "eth0"), 1);

        // Parse-then-rewrite cycles stay at one block too
        for _ in 0..3 {
            let mut parsed = DhcpcdConf::parse(&conf.render());
            parsed.set_static("eth0", &addr, gw, &dns);
            conf = parsed;
        }
        assert_eq!(begin_marker_count(&conf.render(), "eth0"), 1);
    }

    #[test]
    fn test_clear_removes_static_assignment() {
        let (addr, gw, dns) = static_cfg();
        let mut conf = DhcpcdConf::default();
        conf.set_static("eth0", &addr, gw, &dns);
        conf.clear("eth0");

        assert!(!conf.contains("eth0"));
        assert!(!conf.render().contains("static ip_address"));

        // Clearing an absent block is a no-op
        conf.clear("eth0");
        assert_eq!(begin_marker_count(&conf.render(), "eth0"), 0);
    }

    #[test]
    fn test_unmanaged_content_preserved() {
        let original = "# A sample configuration for dhcpcd.\nhostname\nclientid\npersistent\noption rapid_commit\n";
        let (addr, gw, dns) = static_cfg();

        let mut conf = DhcpcdConf::parse(original);
        conf.set_static("eth0", &addr, gw, &dns);
        let rendered = conf.render();

        assert!(rendered.starts_with(original));

        // Removing the block restores the original bytes
        let mut conf = DhcpcdConf::parse(&rendered);
        conf.clear("eth0");
        assert_eq!(conf.render(), original);
    }

    #[test]
    fn test_blocks_for_other_interfaces_untouched() {
        let (addr, gw, dns) = static_cfg();
        let wlan_addr: Ipv4Cidr = "10.0.0.5/16".parse().unwrap();

        let mut conf = DhcpcdConf::default();
        conf.set_static("eth0", &addr, gw, &dns);
        conf.set_static("wlan0", &wlan_addr, gw, &[]);
        conf.clear("eth0");

        let rendered = conf.render();
        assert!(!rendered.contains("192.168.0.50"));
        assert!(rendered.contains("static ip_address=10.0.0.5/16"));
    }

    #[test]
    fn test_parse_tolerates_missing_end_marker() {
        let content = "hostname\n# BEGIN signnet eth0\ninterface eth0\nstatic ip_address=192.168.0.50/24\n";
        let conf = DhcpcdConf::parse(content);
        assert!(conf.contains("eth0"));
        assert_eq!(conf.render().matches("# END signnet eth0").count(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let conf = DhcpcdConf::load(&dir.path().join("dhcpcd.conf"))
            .await
            .unwrap();
        assert_eq!(conf.render(), "");
    }

    #[tokio::test]
    async fn test_store_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dhcpcd.conf");
        let (addr, gw, dns) = static_cfg();

        let mut conf = DhcpcdConf::parse("hostname\n");
        conf.set_static("eth0", &addr, gw, &dns);
        conf.store(&path).await.unwrap();

        let reloaded = DhcpcdConf::load(&path).await.unwrap();
        assert!(reloaded.contains("eth0"));
        assert_eq!(reloaded.render(), conf.render());
    }
}
