use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::{chain::Chain, error::SwapError};

/// Quote mode reported by the aggregator API. Decided once here at the API
/// boundary and carried as a typed tag from then on; unrecognized wire
/// strings are preserved for diagnostics instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuoteMode {
    TcToTc,
    Erc20ToErc20,
    Arc20ToArc20,
    Bep20ToBep20,
    Erc20ToTc,
    Arc20ToTc,
    Bep20ToTc,
    TcToErc20,
    TcToArc20,
    TcToBep20,
    Unknown(String),
}

impl QuoteMode {
    pub fn as_str(&self) -> &str {
        match self {
            QuoteMode::TcToTc => "TC-TC",
            QuoteMode::Erc20ToErc20 => "ERC20-ERC20",
            QuoteMode::Arc20ToArc20 => "ARC20-ARC20",
            QuoteMode::Bep20ToBep20 => "BEP20-BEP20",
            QuoteMode::Erc20ToTc => "ERC20-TC",
            QuoteMode::Arc20ToTc => "ARC20-TC",
            QuoteMode::Bep20ToTc => "BEP20-TC",
            QuoteMode::TcToErc20 => "TC-ERC20",
            QuoteMode::TcToArc20 => "TC-ARC20",
            QuoteMode::TcToBep20 => "TC-BEP20",
            QuoteMode::Unknown(raw) => raw,
        }
    }

    /// EVM chain implied by the mode's source-side token family, if any.
    pub fn evm_chain(&self) -> Option<Chain> {
        match self {
            QuoteMode::Erc20ToErc20 | QuoteMode::Erc20ToTc => Some(Chain::Ethereum),
            QuoteMode::Arc20ToArc20 | QuoteMode::Arc20ToTc => Some(Chain::Avalanche),
            QuoteMode::Bep20ToBep20 | QuoteMode::Bep20ToTc => Some(Chain::BinanceSmartChain),
            _ => None,
        }
    }

    /// Both legs swap on the same EVM chain through an aggregator contract.
    pub fn is_aggregator(&self) -> bool {
        matches!(
            self,
            QuoteMode::Erc20ToErc20 | QuoteMode::Arc20ToArc20 | QuoteMode::Bep20ToBep20
        )
    }

    /// Funds enter the protocol through an aggregator's `swapIn`.
    pub fn is_swap_in(&self) -> bool {
        matches!(
            self,
            QuoteMode::Erc20ToTc | QuoteMode::Arc20ToTc | QuoteMode::Bep20ToTc
        )
    }

    /// Funds leave the protocol's vault via a deposit carrying a pool memo.
    pub fn is_swap_out(&self) -> bool {
        matches!(
            self,
            QuoteMode::TcToErc20 | QuoteMode::TcToArc20 | QuoteMode::TcToBep20
        )
    }
}

impl From<String> for QuoteMode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "TC-TC" => QuoteMode::TcToTc,
            "ERC20-ERC20" => QuoteMode::Erc20ToErc20,
            "ARC20-ARC20" => QuoteMode::Arc20ToArc20,
            "BEP20-BEP20" => QuoteMode::Bep20ToBep20,
            "ERC20-TC" => QuoteMode::Erc20ToTc,
            "ARC20-TC" => QuoteMode::Arc20ToTc,
            "BEP20-TC" => QuoteMode::Bep20ToTc,
            "TC-ERC20" => QuoteMode::TcToErc20,
            "TC-ARC20" => QuoteMode::TcToArc20,
            "TC-BEP20" => QuoteMode::TcToBep20,
            _ => QuoteMode::Unknown(raw),
        }
    }
}

impl From<QuoteMode> for String {
    fn from(mode: QuoteMode) -> Self {
        mode.as_str().to_string()
    }
}

impl Display for QuoteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Prebuilt EVM transaction attached to an aggregator route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTx {
    pub from: String,
    pub to: String,
    pub data: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingSwap {
    #[serde(default)]
    pub transaction: Option<RouteTx>,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Per-route call parameters; the populated subset depends on the quote mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calldata {
    #[serde(default)]
    pub from_asset: Option<String>,
    #[serde(default)]
    pub amount_in: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub memo_streaming_swap: Option<String>,
    #[serde(default)]
    pub expiration: Option<u64>,
    #[serde(default)]
    pub tc_vault: Option<String>,
    #[serde(default)]
    pub tc_router: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub amount_out_min: Option<String>,
    #[serde(default)]
    pub deadline: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    pub quote_mode: QuoteMode,
}

/// A quote route as returned by the aggregator API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRoute {
    pub meta: RouteMeta,
    pub complete: bool,
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(default)]
    pub transaction: Option<RouteTx>,
    #[serde(default)]
    pub streaming_swap: Option<StreamingSwap>,
    #[serde(default)]
    pub calldata: Calldata,
}

/// Dispatch shape for a classified swap route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    /// Protocol-native swap settled by a pool deposit.
    NativeDeposit,
    /// Same-chain aggregator swap executed as a raw EVM transaction.
    AggregatorCall(Chain),
    /// Vault pays out through a deposit carrying a pool-issued memo.
    SwapOutDeposit,
    /// Funds enter through a per-chain aggregator contract's `swapIn`.
    SwapInCall(Chain),
    /// Known-shape route the dispatcher cannot execute; carries the mode
    /// for diagnostics.
    Unsupported(QuoteMode),
}

/// Maps a route to its dispatch shape. First rule wins. Total over complete
/// routes; an incomplete route aborts with a distinct error instead of
/// falling through to `Unsupported`.
pub fn classify(route: &QuoteRoute) -> Result<RouteKind, SwapError> {
    if !route.complete {
        return Err(SwapError::RouteIncomplete);
    }

    let mode = &route.meta.quote_mode;
    if mode.is_aggregator() {
        if let Some(chain) = mode.evm_chain() {
            return Ok(RouteKind::AggregatorCall(chain));
        }
    }
    if mode.is_swap_out() {
        return Ok(RouteKind::SwapOutDeposit);
    }
    if mode.is_swap_in() {
        if let Some(chain) = mode.evm_chain() {
            return Ok(RouteKind::SwapInCall(chain));
        }
    }
    if *mode == QuoteMode::TcToTc {
        return Ok(RouteKind::NativeDeposit);
    }

    Ok(RouteKind::Unsupported(mode.clone()))
}
