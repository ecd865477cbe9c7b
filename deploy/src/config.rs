use std::{fmt, str::FromStr, time::Duration};

use clap::ValueEnum;
use ethers::types::U256;

use crate::error::ScriptError;

/// First account of the Hardhat/Anvil development mnemonic.
const LOCAL_DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

const DEFAULT_GAS_PRICE_GWEI: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Network {
    Localhost,
    Sepolia,
    Mainnet,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::Localhost => "localhost",
            Network::Sepolia => "sepolia",
            Network::Mainnet => "mainnet",
        }
    }

    fn env_prefix(&self) -> &'static str {
        match self {
            Network::Localhost => "LOCALHOST",
            Network::Sepolia => "SEPOLIA",
            Network::Mainnet => "MAINNET",
        }
    }

    fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Localhost => "http://127.0.0.1:8545",
            Network::Sepolia => "https://rpc.sepolia.org",
            Network::Mainnet => "https://eth.llamarpc.com",
        }
    }

    fn default_chain_id(&self) -> u64 {
        match self {
            Network::Localhost => 1337,
            Network::Sepolia => 11155111,
            Network::Mainnet => 1,
        }
    }

    fn default_gas_price(&self) -> Option<U256> {
        match self {
            Network::Localhost => None,
            Network::Sepolia | Network::Mainnet => {
                Some(U256::from(DEFAULT_GAS_PRICE_GWEI) * U256::exp10(9))
            }
        }
    }

    fn default_timeout(&self) -> Option<Duration> {
        match self {
            Network::Sepolia => Some(Duration::from_secs(120)),
            Network::Localhost | Network::Mainnet => None,
        }
    }

    pub fn explorer_url(&self) -> Option<&'static str> {
        match self {
            Network::Localhost => None,
            Network::Sepolia => Some("https://sepolia.etherscan.io"),
            Network::Mainnet => Some("https://etherscan.io"),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything needed to talk to one network profile.
#[derive(Clone)]
pub struct NetworkConfig {
    pub network: Network,
    pub rpc_url: String,
    pub chain_id: u64,
    /// Legacy gas price in wei; `None` lets the node price transactions.
    pub gas_price: Option<U256>,
    pub private_key: Option<String>,
    pub etherscan_api_key: Option<String>,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("network", &self.network)
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("gas_price", &self.gas_price)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("etherscan_api_key", &self.etherscan_api_key.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NetworkConfig {
    pub fn from_env(network: Network) -> Result<Self, ScriptError> {
        Self::resolve(network, |key| std::env::var(key).ok())
    }

    /// Builds the profile from `lookup`, falling back to the built-in defaults
    /// for every variable that is unset or empty.
    pub fn resolve<F>(network: Network, lookup: F) -> Result<Self, ScriptError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let prefix = network.env_prefix();

        let rpc_url = var(&format!("{prefix}_RPC_URL"))
            .unwrap_or_else(|| network.default_rpc_url().to_string());

        let chain_id = match var(&format!("{prefix}_CHAIN_ID")) {
            Some(value) => parse_number::<u64>(&format!("{prefix}_CHAIN_ID"), &value)?,
            None => network.default_chain_id(),
        };

        let gas_price = match var(&format!("{prefix}_GAS_PRICE")) {
            Some(value) => Some(U256::from(parse_number::<u128>(
                &format!("{prefix}_GAS_PRICE"),
                &value,
            )?)),
            None => network.default_gas_price(),
        };

        let private_key = var("PRIVATE_KEY").or_else(|| match network {
            Network::Localhost => Some(LOCAL_DEV_PRIVATE_KEY.to_string()),
            Network::Sepolia | Network::Mainnet => None,
        });

        Ok(Self {
            network,
            rpc_url,
            chain_id,
            gas_price,
            private_key,
            etherscan_api_key: var("ETHERSCAN_API_KEY"),
            timeout: network.default_timeout(),
        })
    }

    /// Command-line values win over the environment.
    pub fn with_overrides(mut self, rpc_url: Option<String>, private_key: Option<String>) -> Self {
        if let Some(rpc_url) = rpc_url {
            self.rpc_url = rpc_url;
        }
        if let Some(private_key) = private_key {
            self.private_key = Some(private_key);
        }
        self
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ScriptError> {
    value
        .trim()
        .parse()
        .map_err(|_| ScriptError::Config(format!("{key} is not a number: {value:?}")))
}
