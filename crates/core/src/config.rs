use std::{
    fmt::{self, Display},
    str::FromStr,
};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::error::SwapError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Stagenet,
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Stagenet => write!(f, "stagenet"),
        }
    }
}

impl FromStr for Network {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "stagenet" => Ok(Network::Stagenet),
            other => Err(SwapError::UnknownChain(other.to_string())),
        }
    }
}

/// A deployed aggregator contract entry, validated when the typed registry
/// is built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub name: String,

    /// Chain ticker, e.g. "ETH"
    pub chain: String,

    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which protocol network to route against
    #[serde(default)]
    pub network: Network,

    /// Override for the thornode endpoint
    #[serde(default)]
    pub thornode_url: Option<String>,

    /// Aggregator contracts available for swap-in routing
    #[serde(default)]
    pub aggregators: Vec<AggregatorConfig>,
}

impl Config {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, figment::Error> {
        let config: Config = Figment::new()
            .merge(Yaml::file("tidepool.yaml"))
            .merge(Env::prefixed("TIDEPOOL_"))
            .extract()?;

        Ok(config)
    }
}
