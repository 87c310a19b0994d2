//! Wireless scan command

use anyhow::{Context, Result};

use sign_net_apply::WifiScanner;

/// Wireless scan command: prints the JSON array the web GUI renders
pub struct ScanCommand {
    interface: String,
}

impl ScanCommand {
    pub fn new(interface: String) -> Self {
        Self { interface }
    }

    pub async fn execute(&self) -> Result<()> {
        let scanner = WifiScanner::new();
        let networks = scanner
            .scan(&self.interface)
            .await
            .with_context(|| format!("Failed to scan on {}", self.interface))?;

        let json = serde_json::to_string(&networks)
            .with_context(|| "Failed to serialize scan results")?;
        println!("{}", json);
        Ok(())
    }
}
