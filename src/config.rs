//! Network configuration, loaded from and saved to TOML.
//!
//! Every field has a default matching the Shimmer testnet, so a partial (or
//! empty) file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::isc::RentStructure;
use crate::types::{Bech32Address, ChainId, EvmAddress};
use crate::{
    Error, Result, DEFAULT_WASP_URL, GAS_BUDGET_MULTIPLIER, ISC_ERC20BASETOKENS_ADDRESS,
    ISC_ERC721_ADDRESS, ISC_MAGIC_ADDRESS, MIN_GAS_FEE, TESTNET_CHAIN_ADDRESS,
};

/// Settings of the chain and network requests are sent to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Bech32 alias address of the chain
    #[serde(default = "default_chain_address")]
    pub chain_address: String,
    /// ISC node REST endpoint
    #[serde(default = "default_wasp_url")]
    pub wasp_url: String,
    /// Minimum gas fee, smallest base token unit
    #[serde(default = "default_min_gas_fee")]
    pub min_gas_fee: u64,
    /// Gas budget of constructed requests, as a multiple of `min_gas_fee`
    #[serde(default = "default_gas_budget_multiplier")]
    pub gas_budget_multiplier: u64,
    /// Timeout of one bridge call in seconds (0 disables it)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// L1 storage deposit parameters
    #[serde(default)]
    pub rent: RentStructure,
    /// Inclusion polling
    #[serde(default)]
    pub inclusion: InclusionConfig,
    /// EVM-side contract addresses
    #[serde(default)]
    pub evm: EvmContracts,
}

/// How long to wait for a transaction to be included
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionConfig {
    /// Delay between polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Polls before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for InclusionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl InclusionConfig {
    /// Delay between polls
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Fixed EVM contract addresses of an ISC chain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvmContracts {
    /// ISC magic contract
    pub magic: EvmAddress,
    /// ERC20 view of base tokens
    pub erc20_base_tokens: EvmAddress,
    /// ERC721 view of NFTs
    pub erc721: EvmAddress,
}

impl Default for EvmContracts {
    fn default() -> Self {
        Self {
            magic: builtin_address(ISC_MAGIC_ADDRESS),
            erc20_base_tokens: builtin_address(ISC_ERC20BASETOKENS_ADDRESS),
            erc721: builtin_address(ISC_ERC721_ADDRESS),
        }
    }
}

fn builtin_address(hex: &str) -> EvmAddress {
    EvmAddress::from_hex(hex).unwrap_or(EvmAddress::ZERO)
}

fn default_chain_address() -> String {
    TESTNET_CHAIN_ADDRESS.to_string()
}

fn default_wasp_url() -> String {
    DEFAULT_WASP_URL.to_string()
}

fn default_min_gas_fee() -> u64 {
    MIN_GAS_FEE
}

fn default_gas_budget_multiplier() -> u64 {
    GAS_BUDGET_MULTIPLIER
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    40
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

impl NetworkConfig {
    /// Shimmer testnet
    #[must_use]
    pub fn testnet() -> Self {
        Self {
            chain_address: default_chain_address(),
            wasp_url: default_wasp_url(),
            min_gas_fee: default_min_gas_fee(),
            gas_budget_multiplier: default_gas_budget_multiplier(),
            request_timeout_secs: default_request_timeout_secs(),
            rent: RentStructure::default(),
            inclusion: InclusionConfig::default(),
            evm: EvmContracts::default(),
        }
    }

    /// Default config location: `~/.isc-bridge/config.toml`
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".isc-bridge")
            .join("config.toml")
    }

    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise use the testnet defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::testnet())
        }
    }

    /// Save to a TOML file, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("{}: {e}", parent.display())))?;
        }
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Ok(())
    }

    /// The chain's L1 address
    pub fn chain_address(&self) -> Result<Bech32Address> {
        Ok(self.chain_address.parse()?)
    }

    /// Chain id behind the chain address
    pub fn chain_id(&self) -> Result<ChainId> {
        Ok(ChainId::parse(&self.chain_address)?)
    }

    /// Gas budget of constructed requests
    #[must_use]
    pub const fn gas_budget(&self) -> u64 {
        self.min_gas_fee.saturating_mul(self.gas_budget_multiplier)
    }

    /// Bridge call timeout, if any
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
