use std::{
    fmt::{self, Display},
    str::FromStr,
};

use alloy::primitives::{Address, U256};
use num_bigint::BigUint;
use num_traits::Zero as _;

use crate::{chain::Chain, error::SwapError};

/// Identifies a fungible unit on a chain. EVM tokens carry their contract
/// address in the symbol (`USDC-0xa0b8…`); synthetic assets live on THORChain
/// and render with a `/` separator instead of `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    pub chain: Chain,
    pub symbol: String,
    pub ticker: String,
    pub synthetic: bool,
    pub decimals: u8,
}

impl Asset {
    pub fn new(chain: Chain, symbol: impl Into<String>, decimals: u8, synthetic: bool) -> Self {
        let symbol = symbol.into();
        let ticker = symbol
            .split('-')
            .next()
            .unwrap_or(symbol.as_str())
            .to_string();
        Self {
            chain,
            symbol,
            ticker,
            synthetic,
            decimals,
        }
    }

    pub fn gas_asset(chain: Chain) -> Self {
        Self::new(chain, chain.gas_symbol(), chain.gas_decimals(), false)
    }

    pub fn is_gas_asset(&self) -> bool {
        !self.synthetic && self.symbol == self.chain.gas_symbol()
    }

    /// Chain whose wallet signs transactions for this asset. Synthetics are
    /// THORChain-resident regardless of the underlying chain.
    pub fn wallet_chain(&self) -> Chain {
        if self.synthetic {
            Chain::Thorchain
        } else {
            self.chain
        }
    }

    /// ERC20 contract address embedded in the symbol, if any.
    pub fn token_address(&self) -> Option<Address> {
        let (_, addr) = self.symbol.split_once('-')?;
        Address::from_str(addr).ok()
    }

    /// On-chain representation for the vault router's deposit entry point:
    /// the token contract, or the zero address for the gas asset.
    pub fn evm_representation(&self) -> Result<Address, SwapError> {
        if self.is_gas_asset() {
            return Ok(Address::ZERO);
        }
        self.token_address()
            .ok_or_else(|| SwapError::AssetParse(self.to_string()))
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.synthetic { '/' } else { '.' };
        write!(f, "{}{}{}", self.chain, separator, self.symbol)
    }
}

impl FromStr for Asset {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let synthetic = !s.contains('.') && s.contains('/');
        let (chain_str, symbol) = s
            .split_once(if synthetic { '/' } else { '.' })
            .ok_or_else(|| SwapError::AssetParse(s.to_string()))?;
        if symbol.is_empty() {
            return Err(SwapError::AssetParse(s.to_string()));
        }

        let chain = Chain::from_str(chain_str)?;
        let decimals = if symbol.eq_ignore_ascii_case(chain.gas_symbol()) {
            chain.gas_decimals()
        } else {
            // protocol pool notation; token metadata is the caller's concern
            8
        };

        Ok(Self::new(chain, symbol, decimals, synthetic))
    }
}

/// An [`Asset`] plus an exact base-unit magnitude. All arithmetic is integer;
/// nothing in the memo or descriptor pipeline ever mutates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetAmount {
    pub asset: Asset,
    pub base: BigUint,
}

impl AssetAmount {
    pub fn new(asset: Asset, base: BigUint) -> Self {
        Self { asset, base }
    }

    pub fn from_base_units(asset: Asset, base: u128) -> Self {
        Self::new(asset, BigUint::from(base))
    }

    /// Smallest accepted transfer of a chain's gas asset, used as the carrier
    /// value for memo-only transactions.
    pub fn min_for_chain(chain: Chain) -> Self {
        Self::from_base_units(Asset::gas_asset(chain), chain.min_transfer_base_units())
    }

    pub fn is_positive(&self) -> bool {
        !self.base.is_zero()
    }

    pub fn base_u256(&self) -> U256 {
        U256::from_be_slice(&self.base.to_bytes_be())
    }
}

impl Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.base, self.asset)
    }
}
