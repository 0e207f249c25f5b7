use std::collections::HashMap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{chain::Chain, config::Network, error::SwapError};

/// Inbound routing record a protocol publishes per chain: where to deposit,
/// which router fronts the vault on EVM chains, the fee rate, and whether
/// the chain is halted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundAddress {
    pub chain: Chain,
    pub address: String,
    #[serde(default)]
    pub router: Option<String>,
    #[serde(default)]
    pub gas_rate: String,
    #[serde(default)]
    pub halted: bool,
    #[serde(default)]
    pub global_trading_paused: bool,
    #[serde(default)]
    pub chain_trading_paused: bool,
    #[serde(default)]
    pub chain_lp_actions_paused: bool,
}

impl InboundAddress {
    /// Synthetic always-open record for chains that settle protocol
    /// operations natively and never route through an inbound address.
    pub fn open(chain: Chain) -> Self {
        Self {
            chain,
            address: String::new(),
            router: None,
            gas_rate: "0".to_string(),
            halted: false,
            global_trading_paused: false,
            chain_trading_paused: false,
            chain_lp_actions_paused: false,
        }
    }

    pub fn gas_rate_units(&self) -> u64 {
        self.gas_rate.parse().unwrap_or(0)
    }
}

/// Network-wide mimir flags. Anything at or above 1 halts the matching scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MimirInfo {
    #[serde(default, rename = "HALTCHAINGLOBAL")]
    pub halt_chain_global: i64,
    #[serde(default, rename = "HALTTHORCHAIN")]
    pub halt_thorchain: i64,
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}

impl MimirInfo {
    pub fn trading_halted(&self) -> bool {
        self.halt_chain_global >= 1 || self.halt_thorchain >= 1
    }
}

/// Read side of the thornode REST API the dispatcher depends on.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ThornodeApi: Send + Sync {
    async fn inbound_addresses(&self) -> Result<Vec<InboundAddress>, SwapError>;

    async fn mimir(&self) -> Result<MimirInfo, SwapError>;
}

/// REST client against a thornode endpoint.
#[derive(Debug, Clone)]
pub struct ThornodeClient {
    base_url: String,
    http: reqwest::Client,
}

impl ThornodeClient {
    pub fn new(network: Network) -> Self {
        let base_url = match network {
            Network::Mainnet => "https://thornode.ninerealms.com",
            Network::Stagenet => "https://stagenet-thornode.ninerealms.com",
        };
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ThornodeApi for ThornodeClient {
    async fn inbound_addresses(&self) -> Result<Vec<InboundAddress>, SwapError> {
        let url = format!("{}/thorchain/inbound_addresses", self.base_url);
        debug!(%url, "fetching inbound addresses");
        let addresses = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(addresses)
    }

    async fn mimir(&self) -> Result<MimirInfo, SwapError> {
        let url = format!("{}/thorchain/mimir", self.base_url);
        debug!(%url, "fetching mimir flags");
        let mimir = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(mimir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_address_deserializes_thornode_shape() {
        let raw = r#"{
            "chain": "ETH",
            "pub_key": "thorpub1unused",
            "address": "0x7d44a47e7f4a7b9c4f1d0c2e1e01044e8a31a0c6",
            "router": "0xD37BbE5744D730a1d98d8DC97c42F0Ca46aD7146",
            "halted": false,
            "global_trading_paused": false,
            "chain_trading_paused": false,
            "chain_lp_actions_paused": false,
            "gas_rate": "24",
            "gas_rate_units": "gwei"
        }"#;

        let inbound: InboundAddress = serde_json::from_str(raw).unwrap();
        assert_eq!(inbound.chain, Chain::Ethereum);
        assert_eq!(inbound.gas_rate_units(), 24);
        assert!(inbound.router.is_some());
        assert!(!inbound.halted);
    }

    #[test]
    fn mimir_halt_flags() {
        let raw = r#"{"HALTCHAINGLOBAL": 0, "HALTTHORCHAIN": 1, "MAXBONDPROVIDERS": 6}"#;
        let mimir: MimirInfo = serde_json::from_str(raw).unwrap();
        assert!(mimir.trading_halted());

        let raw = r#"{"MAXBONDPROVIDERS": 6}"#;
        let mimir: MimirInfo = serde_json::from_str(raw).unwrap();
        assert!(!mimir.trading_halted());
    }

    #[test]
    fn open_record_is_never_halted() {
        let inbound = InboundAddress::open(Chain::Thorchain);
        assert!(!inbound.halted);
        assert!(inbound.router.is_none());
        assert_eq!(inbound.gas_rate_units(), 0);
    }
}
