use std::{collections::HashMap, str::FromStr};

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall as _,
};

use crate::{chain::Chain, config::AggregatorConfig, error::SwapError};

// Entry point shared by the per-chain swap-in aggregator contracts.
sol!(
    contract IAggregator {
        function swapIn(
            address tcRouter,
            address tcVault,
            string tcMemo,
            address token,
            uint256 amount,
            uint256 amountOutMin,
            uint256 deadline
        ) external payable;
    }
);

/// A deployed aggregator contract the dispatcher may route swap-in calls to.
#[derive(Debug, Clone)]
pub struct Aggregator {
    pub name: String,
    pub chain: Chain,
    pub address: Address,
}

pub struct SwapInParams {
    pub tc_router: Address,
    pub tc_vault: Address,
    pub tc_memo: String,
    pub token: Address,
    pub amount: U256,
    pub amount_out_min: U256,
    pub deadline: U256,
}

impl Aggregator {
    pub fn swap_in_calldata(&self, params: SwapInParams) -> Bytes {
        IAggregator::swapInCall {
            tcRouter: params.tc_router,
            tcVault: params.tc_vault,
            tcMemo: params.tc_memo,
            token: params.token,
            amount: params.amount,
            amountOutMin: params.amount_out_min,
            deadline: params.deadline,
        }
        .abi_encode()
        .into()
    }
}

/// Typed contract registry keyed by address. Entries are validated when the
/// registry is built; lookups are total and return `None` for anything not
/// registered.
#[derive(Debug, Clone, Default)]
pub struct AggregatorRegistry {
    by_address: HashMap<Address, Aggregator>,
}

impl AggregatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(entries: &[AggregatorConfig]) -> Result<Self, SwapError> {
        let mut registry = Self::new();
        for entry in entries {
            let chain = Chain::from_str(&entry.chain)?;
            if !chain.is_evm() {
                return Err(SwapError::InvalidParams(
                    "aggregator contracts only exist on EVM chains",
                ));
            }
            let address = Address::from_str(&entry.address)
                .map_err(|_| SwapError::InvalidParams("malformed aggregator address"))?;
            registry.insert(Aggregator {
                name: entry.name.clone(),
                chain,
                address,
            });
        }
        Ok(registry)
    }

    pub fn insert(&mut self, aggregator: Aggregator) {
        self.by_address.insert(aggregator.address, aggregator);
    }

    /// Looks up a route's contract string. Parsing normalizes case, so mixed-
    /// and lower-cased wire addresses resolve to the same entry.
    pub fn get(&self, raw_address: &str) -> Option<&Aggregator> {
        let address = Address::from_str(raw_address).ok()?;
        self.by_address.get(&address)
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}
