use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub evm: EvmConfig,
    pub solana: SolanaConfig,
    pub pumpfun: PumpFunConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the platform backend.
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EvmConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub network: String,
    pub factory_address: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SolanaConfig {
    pub rpc_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PumpFunConfig {
    pub portal_url: String,
    pub ipfs_url: String,
    pub jito_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChartConfig {
    /// Live-update polling interval for chart subscriptions.
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://overdive.xyz".to_string(),
            },
            evm: EvmConfig {
                rpc_url: "https://sepolia.base.org".to_string(),
                chain_id: 84532,
                network: "testnet".to_string(),
                factory_address: crate::contract::DEFAULT_FACTORY_ADDRESS.to_string(),
            },
            solana: SolanaConfig {
                rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            },
            pumpfun: PumpFunConfig {
                portal_url: "https://pumpportal.fun".to_string(),
                ipfs_url: "https://pump.fun/api/ipfs".to_string(),
                jito_url: "https://mainnet.block-engine.jito.wtf/api/v1/bundles".to_string(),
            },
            chart: ChartConfig {
                poll_interval_secs: 10,
            },
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&config_str)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        fs::write(path, config_str)?;
        Ok(())
    }

    /// Environment variables take precedence over file values, matching
    /// how deployments override endpoints without editing config files.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("OVERDIVE_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(url) = env::var("SOLANA_RPC_URL") {
            self.solana.rpc_url = url;
        }
        if let Ok(address) = env::var("FACTORY_ADDRESS") {
            self.evm.factory_address = address;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.api.base_url, config.api.base_url);
        assert_eq!(parsed.evm.factory_address, config.evm.factory_address);
        assert_eq!(parsed.chart.poll_interval_secs, 10);
    }
}
