use crate::{chain::Chain, wallet::WalletError};

/// Failure taxonomy surfaced by every public operation. No silent recovery:
/// anything an adapter or thornode reports is mapped here and returned to the
/// caller.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("no wallet connected for chain {0}")]
    WalletConnectionMissing(Chain),

    #[error("sender address {address} is not supported on {chain}")]
    InvalidSenderAddress { chain: Chain, address: String },

    #[error("trading is halted on {0}")]
    ChainHalted(Chain),

    #[error("no inbound address published for chain {0}")]
    InboundDataMissing(Chain),

    #[error("swap route is not complete")]
    RouteIncomplete,

    #[error("quote mode {0} is not supported")]
    RouteUnsupported(String),

    #[error("no aggregator registered for contract {0}")]
    ContractNotSupported(String),

    #[error("could not recognize swap asset in route calldata")]
    AssetNotRecognized,

    #[error("unknown chain identifier: {0}")]
    UnknownChain(String),

    #[error("invalid asset identifier: {0}")]
    AssetParse(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(&'static str),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("gas error: {0}")]
    Gas(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("user rejected: {0}")]
    UserRejected(String),

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("thornode request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl SwapError {
    /// Best-effort classification of an adapter failure by case-insensitive
    /// substring. First match wins, in this order; anything unrecognized is a
    /// generic transaction error.
    pub fn from_wallet(err: WalletError) -> Self {
        let message = err.to_string();
        let lower = message.to_lowercase();

        if lower.contains("insufficient funds") {
            Self::InsufficientFunds(message)
        } else if lower.contains("gas") {
            Self::Gas(message)
        } else if lower.contains("server") {
            Self::Server(message)
        } else if lower.contains("user rejected") {
            Self::UserRejected(message)
        } else {
            Self::Transaction(message)
        }
    }
}
