use std::{collections::HashMap, sync::Arc};

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::{asset::AssetAmount, chain::Chain, error::SwapError};

/// Opaque failure reported by a wallet adapter. The dispatcher classifies
/// these by message content; adapters are free to pass provider errors
/// through verbatim.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct WalletError(String);

impl WalletError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn unsupported(operation: &str) -> Self {
        Self(format!("wallet does not support {operation}"))
    }
}

/// Fee urgency, applied as a multiplier on the published inbound gas rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeOption {
    Average,
    Fast,
    Fastest,
}

impl FeeOption {
    pub fn gas_multiplier(&self) -> f64 {
        match self {
            FeeOption::Average => 1.2,
            FeeOption::Fast => 1.5,
            FeeOption::Fastest => 2.0,
        }
    }
}

/// Parameters for native deposits and plain transfers.
#[derive(Debug, Clone)]
pub struct TransferParams {
    pub amount: AssetAmount,
    pub recipient: String,
    pub memo: String,
    pub from: String,
    pub fee_rate: Option<u64>,
    pub fee_option: FeeOption,
}

/// A prepared contract invocation (vault router or aggregator).
#[derive(Debug, Clone)]
pub struct ContractCallParams {
    pub contract: Address,
    pub func_name: &'static str,
    pub calldata: Bytes,
    pub from: String,
    pub value: Option<U256>,
}

/// A fully-formed EVM transaction, sent as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmTxRequest {
    pub from: String,
    pub to: String,
    pub data: String,
    pub value: U256,
    pub chain_id: u64,
}

/// ERC20 allowance query/mutation parameters.
#[derive(Debug, Clone)]
pub struct ApproveParams {
    pub asset_address: Address,
    pub spender: Address,
    pub amount: U256,
    pub from: String,
}

/// One connected wallet per chain. Adapters own signing and broadcast; the
/// dispatcher only ever hands them a prepared call shape. Methods a chain
/// family cannot perform keep the default body and report as unsupported.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn address(&self) -> String;

    async fn transfer(&self, params: TransferParams) -> Result<String, WalletError>;

    async fn deposit(&self, params: TransferParams) -> Result<String, WalletError> {
        let _ = params;
        Err(WalletError::unsupported("deposit"))
    }

    async fn call(&self, params: ContractCallParams) -> Result<String, WalletError> {
        let _ = params;
        Err(WalletError::unsupported("call"))
    }

    async fn send_transaction(
        &self,
        tx: EvmTxRequest,
        fee_option: FeeOption,
    ) -> Result<String, WalletError> {
        let _ = (tx, fee_option);
        Err(WalletError::unsupported("send_transaction"))
    }

    async fn is_approved(&self, params: ApproveParams) -> Result<bool, WalletError> {
        let _ = params;
        Err(WalletError::unsupported("is_approved"))
    }

    async fn approve(&self, params: ApproveParams) -> Result<String, WalletError> {
        let _ = params;
        Err(WalletError::unsupported("approve"))
    }
}

/// The set of connected wallet adapters, keyed by chain. Absence of a chain
/// is a typed "not connected" result rather than a lookup surprise.
#[derive(Default, Clone)]
pub struct WalletRegistry {
    wallets: HashMap<Chain, Arc<dyn WalletAdapter>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, chain: Chain, wallet: Arc<dyn WalletAdapter>) {
        self.wallets.insert(chain, wallet);
    }

    pub fn get(&self, chain: Chain) -> Result<&Arc<dyn WalletAdapter>, SwapError> {
        self.wallets
            .get(&chain)
            .ok_or(SwapError::WalletConnectionMissing(chain))
    }

    /// Connected address for a chain, empty when no wallet is connected.
    pub fn address(&self, chain: Chain) -> String {
        self.wallets
            .get(&chain)
            .map(|wallet| wallet.address())
            .unwrap_or_default()
    }
}
