use std::{str::FromStr, sync::Arc};

use alloy::primitives::U256;
use num_bigint::BigUint;
use tracing::{debug, instrument, warn};

use crate::{
    asset::{Asset, AssetAmount},
    chain::Chain,
    contracts::{AggregatorRegistry, SwapInParams},
    error::SwapError,
    memo::{self, Memo},
    route::{self, QuoteRoute, RouteKind},
    thornode::{InboundAddress, ThornodeApi},
    tx::{self, AssembleParams, TxDescriptor},
    wallet::{ContractCallParams, EvmTxRequest, FeeOption, TransferParams, WalletRegistry},
};

/// Which side(s) of a pool an operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Sym,
    Rune,
    Asset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanKind {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SavingsAction {
    Add,
    Withdraw { percent: f64 },
}

#[derive(Debug, Clone)]
pub enum NodeAction {
    Bond { address: String, amount: AssetAmount },
    Unbond { address: String, amount: AssetAmount },
    Leave { address: String },
}

/// Parameters of the deposit engine. `deposit_to_pool` fills recipient,
/// router and fee rate from the chain's inbound record; `transfer` leaves
/// the recipient empty for pool-deposit semantics.
#[derive(Debug, Clone)]
pub struct DepositParams {
    pub amount: AssetAmount,
    pub recipient: String,
    pub memo: String,
    pub router: Option<String>,
    pub expiration: Option<u64>,
    pub fee_rate: Option<u64>,
    pub fee_option: FeeOption,
}

#[derive(Debug, Clone)]
pub struct SwapParams {
    pub route: QuoteRoute,
    pub recipient: String,
    pub stream_swap: bool,
    pub fee_option: Option<FeeOption>,
}

#[derive(Debug, Clone)]
pub struct AddLiquidityParams {
    pub rune_amount: AssetAmount,
    pub asset_amount: AssetAmount,
    pub rune_address: Option<String>,
    pub asset_address: Option<String>,
    /// A symmetric add whose asset side is already pending on the pool.
    pub pending_symm_asset: bool,
    pub mode: Side,
}

#[derive(Debug, Clone)]
pub struct AddLiquidityPartParams {
    pub amount: AssetAmount,
    pub pool: Asset,
    pub address: Option<String>,
    pub symmetric: bool,
}

#[derive(Debug, Clone)]
pub struct WithdrawParams {
    pub asset: Asset,
    /// Fraction of the position in [0, 1]
    pub percent: f64,
    pub from: Side,
    pub to: Side,
    pub memo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoanParams {
    pub amount: AssetAmount,
    pub min_amount: AssetAmount,
    pub kind: LoanKind,
    pub memo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SavingsParams {
    pub amount: AssetAmount,
    pub action: SavingsAction,
    pub memo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ThornameRegisterParams {
    pub amount: AssetAmount,
    pub name: String,
    pub chain: Chain,
    pub address: String,
    pub owner: Option<String>,
}

/// Result of a two-legged liquidity operation. The legs are independent:
/// one side failing neither aborts nor rolls back the other, and each
/// side's outcome is reported on its own.
#[derive(Debug, Default)]
pub struct LiquidityOutcome {
    pub rune_tx: Option<String>,
    pub asset_tx: Option<String>,
    pub rune_error: Option<SwapError>,
    pub asset_error: Option<SwapError>,
}

/// The dispatcher: builds memos, classifies routes, assembles descriptors
/// and hands exactly one send per call to the matching wallet adapter.
pub struct Thorchain {
    wallets: WalletRegistry,
    thornode: Arc<dyn ThornodeApi>,
    aggregators: AggregatorRegistry,
}

impl Thorchain {
    pub fn new(
        wallets: WalletRegistry,
        thornode: Arc<dyn ThornodeApi>,
        aggregators: AggregatorRegistry,
    ) -> Self {
        Self {
            wallets,
            thornode,
            aggregators,
        }
    }

    /// Inbound routing record for a chain. THORChain and Maya settle
    /// natively and short-circuit to an always-open record without touching
    /// the network; a halted record aborts here, before any descriptor is
    /// built.
    pub async fn get_inbound_data_by_chain(
        &self,
        chain: Chain,
    ) -> Result<InboundAddress, SwapError> {
        if chain.is_protocol_native() {
            return Ok(InboundAddress::open(chain));
        }

        let addresses = self.thornode.inbound_addresses().await?;
        let inbound = addresses
            .into_iter()
            .find(|inbound| inbound.chain == chain)
            .ok_or(SwapError::InboundDataMissing(chain))?;

        if inbound.halted {
            return Err(SwapError::ChainHalted(chain));
        }
        Ok(inbound)
    }

    /// Native memo-carrying transfer, gated on the network-wide halt flags.
    pub async fn transfer(&self, amount: AssetAmount, memo: String) -> Result<String, SwapError> {
        let mimir = self.thornode.mimir().await?;
        if mimir.trading_halted() {
            return Err(SwapError::ChainHalted(Chain::Thorchain));
        }

        self.deposit(DepositParams {
            amount,
            recipient: String::new(),
            memo,
            router: None,
            expiration: None,
            fee_rate: None,
            fee_option: FeeOption::Fast,
        })
        .await
    }

    /// Deposit to the chain's published inbound address, with the fee rate
    /// scaled by the chosen urgency.
    pub async fn deposit_to_pool(
        &self,
        amount: AssetAmount,
        memo: String,
        fee_option: FeeOption,
    ) -> Result<String, SwapError> {
        let chain = amount.asset.wallet_chain();
        let inbound = self.get_inbound_data_by_chain(chain).await?;
        let fee_rate = (inbound.gas_rate_units() as f64 * fee_option.gas_multiplier()).round() as u64;

        self.deposit(DepositParams {
            amount,
            recipient: inbound.address.clone(),
            memo,
            router: inbound.router,
            expiration: None,
            fee_rate: Some(fee_rate),
            fee_option,
        })
        .await
    }

    /// The deposit engine: validates the sender, assembles the
    /// chain-family descriptor and performs exactly one adapter send.
    #[instrument(skip_all, fields(asset = %params.amount.asset, memo = %params.memo))]
    pub async fn deposit(&self, params: DepositParams) -> Result<String, SwapError> {
        let chain = params.amount.asset.wallet_chain();
        let wallet = self.wallets.get(chain)?;
        let from = wallet.address();
        tx::validate_sender(chain, &from)?;

        // EVM deposits go through the vault router; fall back to the
        // published one when the caller didn't pin it
        let router = match (params.router, chain.is_evm()) {
            (Some(router), _) => Some(router),
            (None, true) => self.get_inbound_data_by_chain(chain).await?.router,
            (None, false) => None,
        };

        let descriptor = tx::assemble(AssembleParams {
            amount: &params.amount,
            recipient: &params.recipient,
            memo: &params.memo,
            router: router.as_deref(),
            expiration: params.expiration,
        })?;
        debug!(?descriptor, "assembled transaction descriptor");

        let result = match descriptor {
            TxDescriptor::NativeDeposit { memo, .. } => {
                wallet
                    .deposit(TransferParams {
                        amount: params.amount,
                        recipient: String::new(),
                        memo,
                        from,
                        fee_rate: params.fee_rate,
                        fee_option: params.fee_option,
                    })
                    .await
            }
            TxDescriptor::NativeTransfer { recipient, memo }
            | TxDescriptor::Transfer { recipient, memo } => {
                wallet
                    .transfer(TransferParams {
                        amount: params.amount,
                        recipient,
                        memo,
                        from,
                        fee_rate: params.fee_rate,
                        fee_option: params.fee_option,
                    })
                    .await
            }
            TxDescriptor::ContractCall {
                contract,
                func_name,
                calldata,
                value,
            } => {
                wallet
                    .call(ContractCallParams {
                        contract,
                        func_name,
                        calldata,
                        from,
                        value,
                    })
                    .await
            }
        };

        result.map_err(SwapError::from_wallet)
    }

    /// Executes a quoted swap route on the wallet matching its
    /// classification.
    #[instrument(skip_all, fields(quote_mode = %params.route.meta.quote_mode))]
    pub async fn swap(&self, params: SwapParams) -> Result<String, SwapError> {
        let SwapParams {
            route,
            recipient: _,
            stream_swap,
            fee_option,
        } = params;

        match route::classify(&route)? {
            RouteKind::AggregatorCall(chain) => {
                let wallet = self.wallets.get(chain)?;
                let chain_id = chain
                    .evm_chain_id()
                    .ok_or(SwapError::InvalidParams("aggregator chain is not EVM"))?;

                let transaction = if stream_swap {
                    route
                        .streaming_swap
                        .as_ref()
                        .and_then(|streaming| streaming.transaction.clone())
                        .or_else(|| route.transaction.clone())
                } else {
                    route.transaction.clone()
                }
                .ok_or(SwapError::InvalidParams("route carries no transaction"))?;

                let value = match transaction.value.as_deref() {
                    Some(raw) => parse_u256(raw)?,
                    None => U256::ZERO,
                };

                let request = EvmTxRequest {
                    from: transaction.from,
                    to: transaction.to.to_lowercase(),
                    data: transaction.data,
                    value,
                    chain_id,
                };

                wallet
                    .send_transaction(request, fee_option.unwrap_or(FeeOption::Average))
                    .await
                    .map_err(SwapError::from_wallet)
            }

            RouteKind::SwapOutDeposit => {
                let (amount, memo) = swap_out_leg(&route, stream_swap)?;
                let inbound = self
                    .get_inbound_data_by_chain(amount.asset.wallet_chain())
                    .await?;

                self.deposit(DepositParams {
                    amount,
                    recipient: inbound.address.clone(),
                    memo,
                    router: route.contract.clone().or(inbound.router),
                    expiration: route.calldata.expiration,
                    fee_rate: None,
                    fee_option: fee_option.unwrap_or(FeeOption::Fast),
                })
                .await
            }

            RouteKind::NativeDeposit => {
                let (amount, memo) = swap_out_leg(&route, stream_swap)?;
                self.deposit_to_pool(amount, memo, fee_option.unwrap_or(FeeOption::Fast))
                    .await
            }

            RouteKind::SwapInCall(chain) => {
                let contract = route
                    .contract
                    .as_deref()
                    .ok_or(SwapError::InvalidParams("route carries no contract"))?;
                let aggregator = self
                    .aggregators
                    .get(contract)
                    .ok_or_else(|| SwapError::ContractNotSupported(contract.to_string()))?;

                let wallet = self.wallets.get(chain)?;
                let from = wallet.address();
                if from.is_empty() {
                    return Err(SwapError::WalletConnectionMissing(chain));
                }

                let calldata = &route.calldata;
                let memo = select_memo(&route, stream_swap).unwrap_or_default();
                let swap_in = SwapInParams {
                    tc_router: tx::parse_address(calldata.tc_router.as_deref().ok_or(
                        SwapError::InvalidParams("swap-in route carries no protocol router"),
                    )?)?,
                    tc_vault: tx::parse_address(calldata.tc_vault.as_deref().ok_or(
                        SwapError::InvalidParams("swap-in route carries no protocol vault"),
                    )?)?,
                    tc_memo: memo,
                    token: tx::parse_address(
                        calldata
                            .token
                            .as_deref()
                            .ok_or(SwapError::AssetNotRecognized)?,
                    )?,
                    amount: parse_u256(
                        calldata
                            .amount
                            .as_deref()
                            .ok_or(SwapError::AssetNotRecognized)?,
                    )?,
                    amount_out_min: match calldata.amount_out_min.as_deref() {
                        Some(raw) => parse_u256(raw)?,
                        None => U256::ZERO,
                    },
                    deadline: U256::from(
                        calldata.deadline.unwrap_or_else(tx::default_expiration),
                    ),
                };

                wallet
                    .call(ContractCallParams {
                        contract: aggregator.address,
                        func_name: "swapIn",
                        calldata: aggregator.swap_in_calldata(swap_in),
                        from,
                        value: None,
                    })
                    .await
                    .map_err(SwapError::from_wallet)
            }

            RouteKind::Unsupported(mode) => Err(SwapError::RouteUnsupported(mode.to_string())),
        }
    }

    /// Adds liquidity to a pool. Sides are sent sequentially, rune first;
    /// failures are collected per side, never rolled back.
    pub async fn add_liquidity(
        &self,
        params: AddLiquidityParams,
    ) -> Result<LiquidityOutcome, SwapError> {
        let AddLiquidityParams {
            rune_amount,
            asset_amount,
            rune_address,
            asset_address,
            pending_symm_asset,
            mode,
        } = params;

        let pool_asset = asset_amount.asset.clone();
        let is_sym = mode == Side::Sym;
        let rune_transfer = rune_amount.is_positive() && (is_sym || mode == Side::Rune);
        let asset_transfer = asset_amount.is_positive() && (is_sym || mode == Side::Asset);

        if !(rune_transfer || asset_transfer) {
            return Err(SwapError::InvalidParams("liquidity add moves no funds"));
        }

        // Branch interaction with pending_symm_asset kept exactly as shipped.
        let include_rune_address = pending_symm_asset || rune_transfer;
        let rune_address = if include_rune_address {
            let address =
                rune_address.unwrap_or_else(|| self.wallets.address(Chain::Thorchain));
            if address.is_empty() {
                return Err(SwapError::InvalidParams(
                    "liquidity add requires a rune address",
                ));
            }
            address
        } else {
            String::new()
        };
        let asset_address = if is_sym || mode == Side::Asset {
            asset_address.unwrap_or_else(|| self.wallets.address(pool_asset.wallet_chain()))
        } else {
            String::new()
        };

        let mut outcome = LiquidityOutcome::default();

        if rune_transfer {
            let memo = Memo::Deposit {
                asset: pool_asset.clone(),
                address: asset_address,
                single_side: false,
            };
            match self
                .deposit_to_pool(rune_amount, memo.to_string(), FeeOption::Fast)
                .await
            {
                Ok(tx) => outcome.rune_tx = Some(tx),
                Err(err) => {
                    warn!(%err, "rune-side liquidity deposit failed");
                    outcome.rune_error = Some(err);
                }
            }
        }

        if asset_transfer {
            let memo = Memo::Deposit {
                asset: pool_asset,
                address: rune_address,
                single_side: false,
            };
            match self
                .deposit_to_pool(asset_amount, memo.to_string(), FeeOption::Fast)
                .await
            {
                Ok(tx) => outcome.asset_tx = Some(tx),
                Err(err) => {
                    warn!(%err, "asset-side liquidity deposit failed");
                    outcome.asset_error = Some(err);
                }
            }
        }

        Ok(outcome)
    }

    /// One half of an asymmetric or staged-symmetric liquidity add.
    pub async fn add_liquidity_part(
        &self,
        params: AddLiquidityPartParams,
    ) -> Result<String, SwapError> {
        let AddLiquidityPartParams {
            amount,
            pool,
            address,
            symmetric,
        } = params;

        let address = match (symmetric, address) {
            (true, Some(address)) => address,
            (true, None) => {
                return Err(SwapError::InvalidParams(
                    "symmetric liquidity part requires a paired address",
                ));
            }
            (false, _) => String::new(),
        };

        let memo = Memo::Deposit {
            asset: pool,
            address,
            single_side: false,
        };
        self.deposit_to_pool(amount, memo.to_string(), FeeOption::Fast)
            .await
    }

    /// Seeds a brand-new pool; both sides are mandatory and sent
    /// sequentially with the same independent-outcome policy as
    /// [`Self::add_liquidity`].
    pub async fn create_liquidity(
        &self,
        rune_amount: AssetAmount,
        asset_amount: AssetAmount,
    ) -> Result<LiquidityOutcome, SwapError> {
        if !rune_amount.is_positive() || !asset_amount.is_positive() {
            return Err(SwapError::InvalidParams(
                "pool creation requires both sides to be positive",
            ));
        }

        let pool_asset = asset_amount.asset.clone();
        let asset_address = self.wallets.address(pool_asset.wallet_chain());
        let rune_address = self.wallets.address(Chain::Thorchain);

        let mut outcome = LiquidityOutcome::default();

        let rune_memo = Memo::Deposit {
            asset: pool_asset.clone(),
            address: asset_address,
            single_side: false,
        };
        match self
            .deposit_to_pool(rune_amount, rune_memo.to_string(), FeeOption::Fast)
            .await
        {
            Ok(tx) => outcome.rune_tx = Some(tx),
            Err(err) => {
                warn!(%err, "rune-side pool creation deposit failed");
                outcome.rune_error = Some(err);
            }
        }

        let asset_memo = Memo::Deposit {
            asset: pool_asset,
            address: rune_address,
            single_side: false,
        };
        match self
            .deposit_to_pool(asset_amount, asset_memo.to_string(), FeeOption::Fast)
            .await
        {
            Ok(tx) => outcome.asset_tx = Some(tx),
            Err(err) => {
                warn!(%err, "asset-side pool creation deposit failed");
                outcome.asset_error = Some(err);
            }
        }

        Ok(outcome)
    }

    /// Withdraws a fraction of a liquidity position. The carrier transaction
    /// moves only the chain's minimum amount; the memo does the work.
    pub async fn withdraw(&self, params: WithdrawParams) -> Result<String, SwapError> {
        let WithdrawParams {
            asset,
            percent,
            from,
            to,
            memo,
        } = params;

        let target = if to == Side::Rune && from != Side::Rune {
            Some(Asset::gas_asset(Chain::Thorchain).to_string())
        } else if (from == Side::Sym && to == Side::Sym)
            || from == Side::Rune
            || from == Side::Asset
        {
            None
        } else {
            Some(asset.to_string())
        };

        let carrier = AssetAmount::min_for_chain(if from == Side::Asset {
            asset.wallet_chain()
        } else {
            Chain::Thorchain
        });

        let memo = memo.unwrap_or_else(|| {
            Memo::Withdraw {
                asset,
                basis_points: memo::basis_points(percent),
                target,
                single_side: false,
            }
            .to_string()
        });

        self.deposit_to_pool(carrier, memo, FeeOption::Fast).await
    }

    /// Opens or closes a lending position against the pool.
    pub async fn loan(&self, params: LoanParams) -> Result<String, SwapError> {
        let LoanParams {
            amount,
            min_amount,
            kind,
            memo,
        } = params;

        let memo = memo.unwrap_or_else(|| {
            let address = self.wallets.address(amount.asset.wallet_chain());
            let asset = amount.asset.to_string();
            let min_amount = Some(min_amount.base.to_string());
            match kind {
                LoanKind::Open => Memo::OpenLoan {
                    asset,
                    address,
                    min_amount,
                },
                LoanKind::Close => Memo::CloseLoan {
                    asset,
                    address,
                    min_amount,
                },
            }
            .to_string()
        });

        self.deposit_to_pool(amount, memo, FeeOption::Fast).await
    }

    /// Single-sided savers deposit or withdrawal.
    pub async fn savings(&self, params: SavingsParams) -> Result<String, SwapError> {
        let SavingsParams {
            amount,
            action,
            memo,
        } = params;

        match action {
            SavingsAction::Add => {
                if !amount.is_positive() {
                    return Err(SwapError::InvalidParams(
                        "savings add requires a positive amount",
                    ));
                }
                let memo = memo.unwrap_or_else(|| {
                    Memo::Deposit {
                        asset: amount.asset.clone(),
                        address: String::new(),
                        single_side: true,
                    }
                    .to_string()
                });
                self.deposit_to_pool(amount, memo, FeeOption::Fast).await
            }
            SavingsAction::Withdraw { percent } => {
                let memo = memo.unwrap_or_else(|| {
                    Memo::Withdraw {
                        asset: amount.asset.clone(),
                        basis_points: memo::basis_points(percent),
                        target: None,
                        single_side: true,
                    }
                    .to_string()
                });
                let carrier = AssetAmount::min_for_chain(amount.asset.wallet_chain());
                self.deposit_to_pool(carrier, memo, FeeOption::Fast).await
            }
        }
    }

    /// Node operator actions. Bond moves the bonded amount; unbond and
    /// leave are memo-only and carry the chain minimum.
    pub async fn node_action(&self, action: NodeAction) -> Result<String, SwapError> {
        let (memo, amount) = match action {
            NodeAction::Bond { address, amount } => (Memo::Bond { address }, amount),
            NodeAction::Unbond { address, amount } => (
                Memo::Unbond {
                    address,
                    amount: amount.base,
                },
                AssetAmount::min_for_chain(Chain::Thorchain),
            ),
            NodeAction::Leave { address } => (
                Memo::Leave { address },
                AssetAmount::min_for_chain(Chain::Thorchain),
            ),
        };

        self.transfer(amount, memo.to_string()).await
    }

    pub async fn register_thorname(
        &self,
        params: ThornameRegisterParams,
    ) -> Result<String, SwapError> {
        let ThornameRegisterParams {
            amount,
            name,
            chain,
            address,
            owner,
        } = params;

        let memo = Memo::ThornameRegister {
            name,
            chain,
            address,
            owner,
        };
        self.transfer(amount, memo.to_string()).await
    }

    /// Checks an ERC20 allowance against the spender. Gas assets, synthetics
    /// and non-EVM chains never need approval and short-circuit to true.
    pub async fn is_asset_value_approved(
        &self,
        amount: &AssetAmount,
        contract: Option<String>,
    ) -> Result<bool, SwapError> {
        if approve_short_circuits(&amount.asset) {
            return Ok(true);
        }
        let chain = amount.asset.chain;
        let params = self.approve_params(amount, contract).await?;
        self.wallets
            .get(chain)?
            .is_approved(params)
            .await
            .map_err(SwapError::from_wallet)
    }

    /// Grants an ERC20 allowance to the spender; idempotent counterpart of
    /// [`Self::is_asset_value_approved`].
    pub async fn approve_asset_value(
        &self,
        amount: &AssetAmount,
        contract: Option<String>,
    ) -> Result<String, SwapError> {
        if approve_short_circuits(&amount.asset) {
            return Ok("approved".to_string());
        }
        let chain = amount.asset.chain;
        let params = self.approve_params(amount, contract).await?;
        self.wallets
            .get(chain)?
            .approve(params)
            .await
            .map_err(SwapError::from_wallet)
    }

    async fn approve_params(
        &self,
        amount: &AssetAmount,
        contract: Option<String>,
    ) -> Result<crate::wallet::ApproveParams, SwapError> {
        let chain = amount.asset.chain;
        let wallet = self.wallets.get(chain)?;
        let from = wallet.address();
        let asset_address = amount.asset.token_address();

        let (Some(asset_address), false) = (asset_address, from.is_empty()) else {
            return Err(SwapError::InvalidParams(
                "approval requires a token address and a connected sender",
            ));
        };

        let spender = match contract {
            Some(contract) => tx::parse_address(&contract)?,
            None => {
                let inbound = self.get_inbound_data_by_chain(chain).await?;
                let router = inbound
                    .router
                    .ok_or(SwapError::InboundDataMissing(chain))?;
                tx::parse_address(&router)?
            }
        };

        Ok(crate::wallet::ApproveParams {
            asset_address,
            spender,
            amount: amount.base_u256(),
            from,
        })
    }
}

fn approve_short_circuits(asset: &Asset) -> bool {
    let is_evm = asset.chain.is_evm();
    (is_evm && asset.is_gas_asset()) || !is_evm || asset.synthetic
}

/// Pulls the vault-side leg out of a route's calldata: the asset leaving the
/// pool and the pool-issued memo.
fn swap_out_leg(route: &QuoteRoute, stream_swap: bool) -> Result<(AssetAmount, String), SwapError> {
    let calldata = &route.calldata;
    let from_asset = calldata
        .from_asset
        .as_deref()
        .ok_or(SwapError::AssetNotRecognized)?;
    let asset = Asset::from_str(from_asset).map_err(|_| SwapError::AssetNotRecognized)?;
    let amount_in = calldata
        .amount_in
        .as_deref()
        .ok_or(SwapError::AssetNotRecognized)?;
    let base = BigUint::from_str(amount_in).map_err(|_| SwapError::AssetNotRecognized)?;

    let memo = select_memo(route, stream_swap).unwrap_or_default();
    Ok((AssetAmount::new(asset, base), memo))
}

fn select_memo(route: &QuoteRoute, stream_swap: bool) -> Option<String> {
    let calldata = &route.calldata;
    if stream_swap {
        calldata
            .memo_streaming_swap
            .clone()
            .or_else(|| calldata.memo.clone())
    } else {
        calldata.memo.clone()
    }
}

fn parse_u256(raw: &str) -> Result<U256, SwapError> {
    U256::from_str(raw).map_err(|_| SwapError::InvalidParams("malformed numeric value"))
}

#[cfg(test)]
mod tests {
    use mockall::predicate::always;

    use crate::{
        config::AggregatorConfig,
        route::{Calldata, QuoteMode, RouteMeta, RouteTx, StreamingSwap},
        thornode::{MimirInfo, MockThornodeApi},
        wallet::MockWalletAdapter,
    };

    use super::*;

    const ETH_ROUTER: &str = "0xD37BbE5744D730a1d98d8DC97c42F0Ca46aD7146";
    const ETH_VAULT: &str = "0x1c84Ad4F4A29Ec1ad4a92b7e5C5bbf9a83e5FA4c";
    const AGG_CONTRACT: &str = "0x86904Eb2b3c743400D03f929F2246EfA80B91215";

    fn rune(base: u128) -> AssetAmount {
        AssetAmount::from_base_units(Asset::gas_asset(Chain::Thorchain), base)
    }

    fn btc(base: u128) -> AssetAmount {
        AssetAmount::from_base_units(Asset::gas_asset(Chain::Bitcoin), base)
    }

    fn btc_inbound(halted: bool) -> InboundAddress {
        InboundAddress {
            chain: Chain::Bitcoin,
            address: "bc1qvault".to_string(),
            router: None,
            gas_rate: "10".to_string(),
            halted,
            global_trading_paused: false,
            chain_trading_paused: false,
            chain_lp_actions_paused: false,
        }
    }

    fn eth_inbound() -> InboundAddress {
        InboundAddress {
            chain: Chain::Ethereum,
            address: ETH_VAULT.to_string(),
            router: Some(ETH_ROUTER.to_string()),
            gas_rate: "24".to_string(),
            halted: false,
            global_trading_paused: false,
            chain_trading_paused: false,
            chain_lp_actions_paused: false,
        }
    }

    fn thornode_with_inbound(inbound: Vec<InboundAddress>) -> MockThornodeApi {
        let mut thornode = MockThornodeApi::new();
        thornode
            .expect_inbound_addresses()
            .returning(move || Ok(inbound.clone()));
        thornode
    }

    fn provider(wallets: WalletRegistry, thornode: MockThornodeApi) -> Thorchain {
        Thorchain::new(wallets, Arc::new(thornode), AggregatorRegistry::new())
    }

    fn agg_route(to: &str, value: Option<&str>) -> QuoteRoute {
        QuoteRoute {
            meta: RouteMeta {
                quote_mode: QuoteMode::Erc20ToErc20,
            },
            complete: true,
            contract: None,
            transaction: Some(RouteTx {
                from: "0xSender".to_string(),
                to: to.to_string(),
                data: "0xdeadbeef".to_string(),
                value: value.map(str::to_string),
            }),
            streaming_swap: None,
            calldata: Calldata::default(),
        }
    }

    #[tokio::test]
    async fn halted_chain_aborts_before_any_send() {
        let mut wallets = WalletRegistry::new();
        // no expectations set; any adapter call would panic the mock
        let mut wallet = MockWalletAdapter::new();
        wallet.expect_address().return_const("bc1qsender".to_string());
        wallets.connect(Chain::Bitcoin, Arc::new(wallet));

        let provider = provider(wallets, thornode_with_inbound(vec![btc_inbound(true)]));
        let err = provider
            .deposit_to_pool(btc(50_000), "DEPOSIT:BTC.BTC:".to_string(), FeeOption::Fast)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::ChainHalted(Chain::Bitcoin)));
    }

    #[tokio::test]
    async fn native_chain_inbound_data_never_hits_the_network() {
        let mut thornode = MockThornodeApi::new();
        thornode.expect_inbound_addresses().times(0);

        let provider = provider(WalletRegistry::new(), thornode);
        for chain in [Chain::Thorchain, Chain::Maya] {
            let inbound = provider.get_inbound_data_by_chain(chain).await.unwrap();
            assert!(!inbound.halted);
            assert!(inbound.router.is_none());
        }
    }

    #[tokio::test]
    async fn missing_inbound_entry_is_reported() {
        let provider = provider(WalletRegistry::new(), thornode_with_inbound(vec![]));
        let err = provider
            .get_inbound_data_by_chain(Chain::Bitcoin)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::InboundDataMissing(Chain::Bitcoin)));
    }

    #[tokio::test]
    async fn taproot_sender_is_rejected_before_dispatch() {
        let mut wallet = MockWalletAdapter::new();
        wallet
            .expect_address()
            .return_const("bc1p5d7rjq7g6rdk2yhzks9smlaqtedr4dekq08ge8".to_string());
        wallet.expect_transfer().times(0);

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Bitcoin, Arc::new(wallet));

        let provider = provider(wallets, thornode_with_inbound(vec![btc_inbound(false)]));
        let err = provider
            .deposit_to_pool(btc(50_000), "DEPOSIT:BTC.BTC:".to_string(), FeeOption::Fast)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidSenderAddress { .. }));
    }

    #[tokio::test]
    async fn missing_wallet_is_a_connection_error() {
        let provider = provider(
            WalletRegistry::new(),
            thornode_with_inbound(vec![btc_inbound(false)]),
        );
        let err = provider
            .deposit_to_pool(btc(50_000), String::new(), FeeOption::Fast)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SwapError::WalletConnectionMissing(Chain::Bitcoin)
        ));
    }

    #[tokio::test]
    async fn utxo_deposit_scales_fee_rate_by_urgency() {
        let mut wallet = MockWalletAdapter::new();
        wallet.expect_address().return_const("bc1qsender".to_string());
        wallet
            .expect_transfer()
            .withf(|params| {
                params.recipient == "bc1qvault"
                    && params.fee_rate == Some(15) // 10 * 1.5
                    && params.memo == "DEPOSIT:BTC.BTC:"
            })
            .times(1)
            .returning(|_| Ok("btc-txid".to_string()));

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Bitcoin, Arc::new(wallet));

        let provider = provider(wallets, thornode_with_inbound(vec![btc_inbound(false)]));
        let tx = provider
            .deposit_to_pool(btc(50_000), "DEPOSIT:BTC.BTC:".to_string(), FeeOption::Fast)
            .await
            .unwrap();
        assert_eq!(tx, "btc-txid");
    }

    #[tokio::test]
    async fn evm_deposit_goes_through_the_vault_router() {
        let mut wallet = MockWalletAdapter::new();
        wallet.expect_address().return_const("0xfeed".to_string());
        wallet
            .expect_call()
            .withf(|params| {
                params.func_name == "depositWithExpiry"
                    && params.contract == tx::parse_address(ETH_ROUTER).unwrap()
                    && params.value.is_some()
            })
            .times(1)
            .returning(|_| Ok("0xethhash".to_string()));

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Ethereum, Arc::new(wallet));

        let provider = provider(wallets, thornode_with_inbound(vec![eth_inbound()]));
        let amount = AssetAmount::from_base_units(
            Asset::gas_asset(Chain::Ethereum),
            1_000_000_000_000_000_000,
        );
        let tx = provider
            .deposit_to_pool(amount, "=:BTC.BTC:bc1qdest".to_string(), FeeOption::Fast)
            .await
            .unwrap();
        assert_eq!(tx, "0xethhash");
    }

    #[tokio::test]
    async fn transfer_respects_mimir_halt() {
        let mut thornode = MockThornodeApi::new();
        thornode.expect_mimir().returning(|| {
            Ok(MimirInfo {
                halt_chain_global: 0,
                halt_thorchain: 1,
                other: Default::default(),
            })
        });

        let provider = provider(WalletRegistry::new(), thornode);
        let err = provider
            .transfer(rune(100), "BOND:thor1node".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::ChainHalted(Chain::Thorchain)));
    }

    #[tokio::test]
    async fn node_bond_transfers_the_bonded_amount() {
        let mut thornode = MockThornodeApi::new();
        thornode.expect_mimir().returning(|| Ok(MimirInfo::default()));

        let mut wallet = MockWalletAdapter::new();
        wallet
            .expect_address()
            .return_const("thor1sender".to_string());
        wallet
            .expect_deposit()
            .withf(|params| {
                params.memo == "BOND:thor1node" && params.amount.base == BigUint::from(100u32)
            })
            .times(1)
            .returning(|_| Ok("thor-txid".to_string()));

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Thorchain, Arc::new(wallet));

        let provider = provider(wallets, thornode);
        let tx = provider
            .node_action(NodeAction::Bond {
                address: "thor1node".to_string(),
                amount: rune(100),
            })
            .await
            .unwrap();
        assert_eq!(tx, "thor-txid");
    }

    #[tokio::test]
    async fn add_liquidity_asset_side_only_sends_once() {
        let mut wallet = MockWalletAdapter::new();
        wallet.expect_address().return_const("bc1qsender".to_string());
        // the rune side moves nothing, so no rune address is paired into
        // the memo and the asset side renders a trailing separator
        wallet
            .expect_transfer()
            .withf(|params| params.memo == "DEPOSIT:BTC.BTC:")
            .times(1)
            .returning(|_| Ok("btc-txid".to_string()));

        let mut thor_wallet = MockWalletAdapter::new();
        thor_wallet
            .expect_address()
            .return_const("thor1rune".to_string());

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Bitcoin, Arc::new(wallet));
        wallets.connect(Chain::Thorchain, Arc::new(thor_wallet));

        let provider = provider(wallets, thornode_with_inbound(vec![btc_inbound(false)]));
        let outcome = provider
            .add_liquidity(AddLiquidityParams {
                rune_amount: rune(0),
                asset_amount: btc(75_000),
                rune_address: None,
                asset_address: None,
                pending_symm_asset: false,
                mode: Side::Sym,
            })
            .await
            .unwrap();

        assert_eq!(outcome.rune_tx, None);
        assert!(outcome.rune_error.is_none());
        assert_eq!(outcome.asset_tx.as_deref(), Some("btc-txid"));
        assert!(outcome.asset_error.is_none());
    }

    #[tokio::test]
    async fn add_liquidity_rune_failure_does_not_abort_asset_side() {
        let mut thornode = MockThornodeApi::new();
        thornode
            .expect_inbound_addresses()
            .returning(|| Ok(vec![btc_inbound(false)]));
        thornode.expect_mimir().never();

        let mut thor_wallet = MockWalletAdapter::new();
        thor_wallet
            .expect_address()
            .return_const("thor1rune".to_string());
        thor_wallet
            .expect_deposit()
            .times(1)
            .returning(|_| Err(crate::wallet::WalletError::new("insufficient funds")));

        let mut btc_wallet = MockWalletAdapter::new();
        btc_wallet
            .expect_address()
            .return_const("bc1qsender".to_string());
        btc_wallet
            .expect_transfer()
            .times(1)
            .returning(|_| Ok("btc-txid".to_string()));

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Thorchain, Arc::new(thor_wallet));
        wallets.connect(Chain::Bitcoin, Arc::new(btc_wallet));

        let provider = provider(wallets, thornode);
        let outcome = provider
            .add_liquidity(AddLiquidityParams {
                rune_amount: rune(100_000_000),
                asset_amount: btc(75_000),
                rune_address: None,
                asset_address: None,
                pending_symm_asset: false,
                mode: Side::Sym,
            })
            .await
            .unwrap();

        assert!(outcome.rune_tx.is_none());
        assert!(matches!(
            outcome.rune_error,
            Some(SwapError::InsufficientFunds(_))
        ));
        assert_eq!(outcome.asset_tx.as_deref(), Some("btc-txid"));
    }

    #[tokio::test]
    async fn add_liquidity_with_no_positive_side_is_invalid() {
        let provider = provider(WalletRegistry::new(), MockThornodeApi::new());
        let err = provider
            .add_liquidity(AddLiquidityParams {
                rune_amount: rune(0),
                asset_amount: btc(0),
                rune_address: None,
                asset_address: None,
                pending_symm_asset: false,
                mode: Side::Sym,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn withdraw_half_symmetric_position() {
        let mut wallet = MockWalletAdapter::new();
        wallet
            .expect_address()
            .return_const("thor1sender".to_string());
        wallet
            .expect_deposit()
            .withf(|params| {
                params.memo == "WITHDRAW:BTC.BTC:5000" && !params.amount.is_positive()
            })
            .times(1)
            .returning(|_| Ok("thor-txid".to_string()));

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Thorchain, Arc::new(wallet));

        let provider = provider(wallets, MockThornodeApi::new());
        let tx = provider
            .withdraw(WithdrawParams {
                asset: Asset::gas_asset(Chain::Bitcoin),
                percent: 0.5,
                from: Side::Sym,
                to: Side::Sym,
                memo: None,
            })
            .await
            .unwrap();
        assert_eq!(tx, "thor-txid");
    }

    #[tokio::test]
    async fn withdraw_to_rune_targets_the_rune_asset() {
        let mut wallet = MockWalletAdapter::new();
        wallet
            .expect_address()
            .return_const("thor1sender".to_string());
        wallet
            .expect_deposit()
            .withf(|params| params.memo == "WITHDRAW:BTC.BTC:10000:THOR.RUNE")
            .times(1)
            .returning(|_| Ok("thor-txid".to_string()));

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Thorchain, Arc::new(wallet));

        let provider = provider(wallets, MockThornodeApi::new());
        provider
            .withdraw(WithdrawParams {
                asset: Asset::gas_asset(Chain::Bitcoin),
                percent: 1.5, // clamps to 10000 bps
                from: Side::Sym,
                to: Side::Rune,
                memo: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn aggregator_swap_sends_exactly_one_lowercased_transaction() {
        let mut wallet = MockWalletAdapter::new();
        wallet.expect_address().return_const("0xfeed".to_string());
        wallet
            .expect_send_transaction()
            .withf(|tx, fee_option| {
                tx.to == AGG_CONTRACT.to_lowercase()
                    && tx.value == U256::ZERO
                    && tx.chain_id == 1
                    && *fee_option == FeeOption::Average
            })
            .times(1)
            .returning(|_, _| Ok("0xswaphash".to_string()));

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Ethereum, Arc::new(wallet));

        let provider = provider(wallets, MockThornodeApi::new());
        let tx = provider
            .swap(SwapParams {
                route: agg_route(AGG_CONTRACT, None),
                recipient: String::new(),
                stream_swap: false,
                fee_option: None,
            })
            .await
            .unwrap();
        assert_eq!(tx, "0xswaphash");
    }

    #[tokio::test]
    async fn incomplete_route_aborts_the_swap() {
        let provider = provider(WalletRegistry::new(), MockThornodeApi::new());
        let mut route = agg_route(AGG_CONTRACT, None);
        route.complete = false;

        let err = provider
            .swap(SwapParams {
                route,
                recipient: String::new(),
                stream_swap: false,
                fee_option: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::RouteIncomplete));
    }

    #[tokio::test]
    async fn unknown_quote_mode_is_unsupported() {
        let provider = provider(WalletRegistry::new(), MockThornodeApi::new());
        let mut route = agg_route(AGG_CONTRACT, None);
        route.meta.quote_mode = QuoteMode::Unknown("SOL-SOL".to_string());

        let err = provider
            .swap(SwapParams {
                route,
                recipient: String::new(),
                stream_swap: false,
                fee_option: None,
            })
            .await
            .unwrap_err();
        match err {
            SwapError::RouteUnsupported(mode) => assert_eq!(mode, "SOL-SOL"),
            other => panic!("expected RouteUnsupported, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn streaming_swap_prefers_the_streaming_transaction() {
        let mut wallet = MockWalletAdapter::new();
        wallet.expect_address().return_const("0xfeed".to_string());
        wallet
            .expect_send_transaction()
            .withf(|tx, _| tx.data == "0xstreaming")
            .times(1)
            .returning(|_, _| Ok("0xswaphash".to_string()));

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Ethereum, Arc::new(wallet));

        let mut route = agg_route(AGG_CONTRACT, Some("42"));
        route.streaming_swap = Some(StreamingSwap {
            transaction: Some(RouteTx {
                from: "0xSender".to_string(),
                to: AGG_CONTRACT.to_string(),
                data: "0xstreaming".to_string(),
                value: None,
            }),
            memo: None,
        });

        let provider = provider(wallets, MockThornodeApi::new());
        provider
            .swap(SwapParams {
                route,
                recipient: String::new(),
                stream_swap: true,
                fee_option: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn swap_out_deposits_toward_the_vault() {
        let mut wallet = MockWalletAdapter::new();
        wallet.expect_address().return_const("bc1qsender".to_string());
        wallet
            .expect_transfer()
            .withf(|params| {
                params.recipient == "bc1qvault"
                    && params.memo == "OUT:pool-issued"
                    && params.amount.base == BigUint::from(123_456u32)
            })
            .times(1)
            .returning(|_| Ok("btc-txid".to_string()));

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Bitcoin, Arc::new(wallet));

        let route = QuoteRoute {
            meta: RouteMeta {
                quote_mode: QuoteMode::TcToErc20,
            },
            complete: true,
            contract: None,
            transaction: None,
            streaming_swap: None,
            calldata: Calldata {
                from_asset: Some("BTC.BTC".to_string()),
                amount_in: Some("123456".to_string()),
                memo: Some("OUT:pool-issued".to_string()),
                ..Calldata::default()
            },
        };

        let provider = provider(wallets, thornode_with_inbound(vec![btc_inbound(false)]));
        provider
            .swap(SwapParams {
                route,
                recipient: String::new(),
                stream_swap: false,
                fee_option: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn swap_in_requires_a_registered_aggregator() {
        let mut wallets = WalletRegistry::new();
        let mut wallet = MockWalletAdapter::new();
        wallet.expect_address().return_const("0xfeed".to_string());
        wallets.connect(Chain::Ethereum, Arc::new(wallet));

        let provider = Thorchain::new(
            wallets,
            Arc::new(MockThornodeApi::new()),
            AggregatorRegistry::new(),
        );

        let mut route = agg_route(AGG_CONTRACT, None);
        route.meta.quote_mode = QuoteMode::Erc20ToTc;
        route.contract = Some(AGG_CONTRACT.to_string());

        let err = provider
            .swap(SwapParams {
                route,
                recipient: String::new(),
                stream_swap: false,
                fee_option: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::ContractNotSupported(_)));
    }

    #[tokio::test]
    async fn swap_in_calls_the_aggregator_contract() {
        let mut wallet = MockWalletAdapter::new();
        wallet.expect_address().return_const("0xfeed".to_string());
        wallet
            .expect_call()
            .withf(|params| {
                params.func_name == "swapIn"
                    && params.contract == tx::parse_address(AGG_CONTRACT).unwrap()
                    && params.value.is_none()
            })
            .times(1)
            .returning(|_| Ok("0xswapin".to_string()));

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Ethereum, Arc::new(wallet));

        let aggregators = AggregatorRegistry::from_config(&[AggregatorConfig {
            name: "uniswap-v2".to_string(),
            chain: "ETH".to_string(),
            address: AGG_CONTRACT.to_string(),
        }])
        .unwrap();

        let route = QuoteRoute {
            meta: RouteMeta {
                quote_mode: QuoteMode::Erc20ToTc,
            },
            complete: true,
            contract: Some(AGG_CONTRACT.to_lowercase()),
            transaction: None,
            streaming_swap: None,
            calldata: Calldata {
                memo: Some("=:BTC.BTC:bc1qdest".to_string()),
                tc_router: Some(ETH_ROUTER.to_string()),
                tc_vault: Some(ETH_VAULT.to_string()),
                token: Some("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string()),
                amount: Some("5000000".to_string()),
                amount_out_min: None,
                deadline: Some(1_700_000_000),
                ..Calldata::default()
            },
        };

        let provider = Thorchain::new(wallets, Arc::new(MockThornodeApi::new()), aggregators);
        let tx = provider
            .swap(SwapParams {
                route,
                recipient: String::new(),
                stream_swap: false,
                fee_option: None,
            })
            .await
            .unwrap();
        assert_eq!(tx, "0xswapin");
    }

    #[tokio::test]
    async fn approve_short_circuits_for_assets_that_never_need_it() {
        let provider = provider(WalletRegistry::new(), MockThornodeApi::new());

        // gas asset on an EVM chain
        let eth = AssetAmount::from_base_units(Asset::gas_asset(Chain::Ethereum), 1);
        assert!(provider.is_asset_value_approved(&eth, None).await.unwrap());

        // non-EVM chain
        let btc = AssetAmount::from_base_units(Asset::gas_asset(Chain::Bitcoin), 1);
        assert!(provider.is_asset_value_approved(&btc, None).await.unwrap());

        // synthetic
        let synth = AssetAmount::from_base_units(
            Asset::from_str("ETH/ETH").unwrap(),
            1,
        );
        assert_eq!(
            provider.approve_asset_value(&synth, None).await.unwrap(),
            "approved"
        );
    }

    #[tokio::test]
    async fn approve_spender_defaults_to_the_inbound_router() {
        let mut wallet = MockWalletAdapter::new();
        wallet.expect_address().return_const("0xfeed".to_string());
        wallet
            .expect_is_approved()
            .withf(|params| params.spender == tx::parse_address(ETH_ROUTER).unwrap())
            .times(1)
            .returning(|_| Ok(false));
        wallet.expect_approve().with(always()).never();

        let mut wallets = WalletRegistry::new();
        wallets.connect(Chain::Ethereum, Arc::new(wallet));

        let provider = provider(wallets, thornode_with_inbound(vec![eth_inbound()]));
        let usdc = AssetAmount::from_base_units(
            Asset::from_str("ETH.USDC-0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap(),
            5_000_000,
        );
        let approved = provider.is_asset_value_approved(&usdc, None).await.unwrap();
        assert!(!approved);
    }
}
