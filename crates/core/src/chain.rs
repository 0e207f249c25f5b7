use std::{
    fmt::{self, Display},
    str::FromStr,
};

use alloy_chains::NamedChain;
use serde::{Deserialize, Serialize};

use crate::error::SwapError;

/// Closed set of chains the dispatcher can route to. The protocol's chain
/// tickers double as the wire representation in thornode payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    #[serde(rename = "THOR")]
    Thorchain,
    #[serde(rename = "MAYA")]
    Maya,
    #[serde(rename = "ETH")]
    Ethereum,
    #[serde(rename = "AVAX")]
    Avalanche,
    #[serde(rename = "BSC")]
    BinanceSmartChain,
    #[serde(rename = "BTC")]
    Bitcoin,
    #[serde(rename = "BCH")]
    BitcoinCash,
    #[serde(rename = "LTC")]
    Litecoin,
    #[serde(rename = "DOGE")]
    Dogecoin,
    #[serde(rename = "GAIA")]
    Cosmos,
}

impl Chain {
    pub const fn ticker(&self) -> &'static str {
        match self {
            Chain::Thorchain => "THOR",
            Chain::Maya => "MAYA",
            Chain::Ethereum => "ETH",
            Chain::Avalanche => "AVAX",
            Chain::BinanceSmartChain => "BSC",
            Chain::Bitcoin => "BTC",
            Chain::BitcoinCash => "BCH",
            Chain::Litecoin => "LTC",
            Chain::Dogecoin => "DOGE",
            Chain::Cosmos => "GAIA",
        }
    }

    /// Chains whose deposits go through a vault router contract.
    pub const fn is_evm(&self) -> bool {
        matches!(
            self,
            Chain::Ethereum | Chain::Avalanche | Chain::BinanceSmartChain
        )
    }

    /// Chains that settle protocol operations natively and bypass
    /// inbound-address routing.
    pub const fn is_protocol_native(&self) -> bool {
        matches!(self, Chain::Thorchain | Chain::Maya)
    }

    pub fn evm_chain_id(&self) -> Option<u64> {
        let named = match self {
            Chain::Ethereum => NamedChain::Mainnet,
            Chain::Avalanche => NamedChain::Avalanche,
            Chain::BinanceSmartChain => NamedChain::BinanceSmartChain,
            _ => return None,
        };
        Some(alloy_chains::Chain::from_named(named).id())
    }

    /// Symbol of the chain's fee-paying asset.
    pub const fn gas_symbol(&self) -> &'static str {
        match self {
            Chain::Thorchain => "RUNE",
            Chain::Maya => "CACAO",
            Chain::Ethereum => "ETH",
            Chain::Avalanche => "AVAX",
            Chain::BinanceSmartChain => "BNB",
            Chain::Bitcoin => "BTC",
            Chain::BitcoinCash => "BCH",
            Chain::Litecoin => "LTC",
            Chain::Dogecoin => "DOGE",
            Chain::Cosmos => "ATOM",
        }
    }

    pub const fn gas_decimals(&self) -> u8 {
        match self {
            Chain::Thorchain | Chain::Bitcoin | Chain::BitcoinCash | Chain::Litecoin
            | Chain::Dogecoin => 8,
            Chain::Maya => 10,
            Chain::Ethereum | Chain::Avalanche | Chain::BinanceSmartChain => 18,
            Chain::Cosmos => 6,
        }
    }

    /// Smallest transfer the protocol accepts on this chain, in base units of
    /// the gas asset. Memo-only native transactions use these as their value.
    pub const fn min_transfer_base_units(&self) -> u128 {
        match self {
            Chain::Thorchain | Chain::Maya => 0,
            Chain::Bitcoin | Chain::BitcoinCash | Chain::Litecoin => 10_001,
            Chain::Dogecoin => 100_000_001,
            Chain::Ethereum | Chain::Avalanche | Chain::BinanceSmartChain => 10_000_000_000,
            Chain::Cosmos => 1,
        }
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

impl FromStr for Chain {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "THOR" => Ok(Chain::Thorchain),
            "MAYA" => Ok(Chain::Maya),
            "ETH" => Ok(Chain::Ethereum),
            "AVAX" => Ok(Chain::Avalanche),
            "BSC" => Ok(Chain::BinanceSmartChain),
            "BTC" => Ok(Chain::Bitcoin),
            "BCH" => Ok(Chain::BitcoinCash),
            "LTC" => Ok(Chain::Litecoin),
            "DOGE" => Ok(Chain::Dogecoin),
            "GAIA" => Ok(Chain::Cosmos),
            other => Err(SwapError::UnknownChain(other.to_string())),
        }
    }
}
