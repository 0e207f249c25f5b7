use std::{
    str::FromStr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall as _,
};

use crate::{asset::AssetAmount, chain::Chain, error::SwapError};

// Same deposit entry point on the Ethereum, Avalanche and BSC vault routers.
sol!(
    contract IVaultRouter {
        function depositWithExpiry(
            address vault,
            address asset,
            uint256 amount,
            string memo,
            uint256 expiration
        ) external payable;
    }
);

/// How long an EVM vault deposit stays valid when the caller does not pin an
/// expiration.
const DEPOSIT_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// Chain-family-specific call shape handed to the wallet adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxDescriptor {
    /// Protocol-native pool deposit (no recipient).
    NativeDeposit { recipient: String, memo: String },
    /// Protocol-native transfer to an address.
    NativeTransfer { recipient: String, memo: String },
    /// Vault router invocation on an EVM chain.
    ContractCall {
        contract: Address,
        func_name: &'static str,
        calldata: Bytes,
        value: Option<U256>,
    },
    /// Generic transfer on every other chain family.
    Transfer { recipient: String, memo: String },
}

pub struct AssembleParams<'a> {
    pub amount: &'a AssetAmount,
    pub recipient: &'a str,
    pub memo: &'a str,
    pub router: Option<&'a str>,
    pub expiration: Option<u64>,
}

/// Combines asset, recipient, memo and router into the call shape for the
/// asset's chain family.
pub fn assemble(params: AssembleParams<'_>) -> Result<TxDescriptor, SwapError> {
    let AssembleParams {
        amount,
        recipient,
        memo,
        router,
        expiration,
    } = params;
    let chain = amount.asset.wallet_chain();

    if chain.is_protocol_native() {
        return Ok(if recipient.is_empty() {
            TxDescriptor::NativeDeposit {
                recipient: String::new(),
                memo: memo.to_string(),
            }
        } else {
            TxDescriptor::NativeTransfer {
                recipient: recipient.to_string(),
                memo: memo.to_string(),
            }
        });
    }

    if chain.is_evm() {
        let router = router.ok_or(SwapError::InvalidParams(
            "EVM deposit requires a router contract",
        ))?;
        let contract = parse_address(router)?;
        let vault = parse_address(recipient)?;

        let call = IVaultRouter::depositWithExpiryCall {
            vault,
            asset: amount.asset.evm_representation()?,
            amount: amount.base_u256(),
            memo: memo.to_string(),
            expiration: U256::from(expiration.unwrap_or_else(default_expiration)),
        };

        return Ok(TxDescriptor::ContractCall {
            contract,
            func_name: "depositWithExpiry",
            calldata: call.abi_encode().into(),
            value: amount.asset.is_gas_asset().then(|| amount.base_u256()),
        });
    }

    Ok(TxDescriptor::Transfer {
        recipient: recipient.to_string(),
        memo: memo.to_string(),
    })
}

/// Rejects sender addresses the system cannot spend from. Bitcoin taproot
/// (`bc1p…`) outputs are unsupported for outbound sends.
pub fn validate_sender(chain: Chain, address: &str) -> Result<(), SwapError> {
    let supported = match chain {
        _ if address.is_empty() => false,
        Chain::Bitcoin => !address.starts_with("bc1p"),
        _ => true,
    };

    if supported {
        Ok(())
    } else {
        Err(SwapError::InvalidSenderAddress {
            chain,
            address: address.to_string(),
        })
    }
}

pub fn parse_address(raw: &str) -> Result<Address, SwapError> {
    Address::from_str(raw).map_err(|_| SwapError::InvalidParams("malformed EVM address"))
}

pub fn default_expiration() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now + DEPOSIT_EXPIRY).as_secs()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use crate::asset::Asset;

    use super::*;

    const ROUTER: &str = "0xD37BbE5744D730a1d98d8DC97c42F0Ca46aD7146";
    const VAULT: &str = "0x1c84Ad4F4A29Ec1ad4a92b7e5C5bbf9a83e5FA4c";

    fn rune(base: u128) -> AssetAmount {
        AssetAmount::from_base_units(Asset::gas_asset(Chain::Thorchain), base)
    }

    fn eth(base: u128) -> AssetAmount {
        AssetAmount::from_base_units(Asset::gas_asset(Chain::Ethereum), base)
    }

    #[test]
    fn native_chain_empty_recipient_is_pool_deposit() {
        let amount = rune(100);
        let descriptor = assemble(AssembleParams {
            amount: &amount,
            recipient: "",
            memo: "DEPOSIT:BTC.BTC:thor1abcd",
            router: None,
            expiration: None,
        })
        .unwrap();
        assert!(matches!(descriptor, TxDescriptor::NativeDeposit { .. }));

        let descriptor = assemble(AssembleParams {
            amount: &amount,
            recipient: "thor1dest",
            memo: "",
            router: None,
            expiration: None,
        })
        .unwrap();
        assert!(matches!(descriptor, TxDescriptor::NativeTransfer { ref recipient, .. } if recipient == "thor1dest"));
    }

    #[test]
    fn evm_deposit_attaches_value_only_for_gas_asset() {
        let amount = eth(1_000_000_000_000_000_000);
        let descriptor = assemble(AssembleParams {
            amount: &amount,
            recipient: VAULT,
            memo: "=:BTC.BTC:bc1qdest",
            router: Some(ROUTER),
            expiration: Some(1_700_000_000),
        })
        .unwrap();

        match descriptor {
            TxDescriptor::ContractCall {
                contract,
                func_name,
                value,
                ..
            } => {
                assert_eq!(contract, Address::from_str(ROUTER).unwrap());
                assert_eq!(func_name, "depositWithExpiry");
                assert_eq!(value, Some(amount.base_u256()));
            }
            other => panic!("expected contract call, got {other:?}"),
        }

        let token = AssetAmount::from_base_units(
            Asset::from_str("ETH.USDC-0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap(),
            5_000_000,
        );
        let descriptor = assemble(AssembleParams {
            amount: &token,
            recipient: VAULT,
            memo: "",
            router: Some(ROUTER),
            expiration: Some(1_700_000_000),
        })
        .unwrap();
        assert!(matches!(descriptor, TxDescriptor::ContractCall { value: None, .. }));
    }

    #[test]
    fn evm_deposit_without_router_is_rejected() {
        let amount = eth(1);
        let err = assemble(AssembleParams {
            amount: &amount,
            recipient: VAULT,
            memo: "",
            router: None,
            expiration: None,
        })
        .unwrap_err();
        assert!(matches!(err, SwapError::InvalidParams(_)));
    }

    #[test]
    fn expiration_defaults_to_the_future() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let expiry = default_expiration();
        assert!(expiry >= now + 14 * 60);
        assert!(expiry <= now + 16 * 60);
    }

    #[test]
    fn other_chains_fall_back_to_generic_transfer() {
        let amount = AssetAmount::from_base_units(Asset::gas_asset(Chain::Bitcoin), 10_001);
        let descriptor = assemble(AssembleParams {
            amount: &amount,
            recipient: "bc1qvault",
            memo: "DEPOSIT:BTC.BTC:",
            router: None,
            expiration: None,
        })
        .unwrap();
        assert!(matches!(descriptor, TxDescriptor::Transfer { .. }));
    }

    #[test]
    fn taproot_senders_are_rejected() {
        assert!(validate_sender(Chain::Bitcoin, "bc1p5d7rjq7g6rdk2yhzks9smlaqtedr4dekq08ge8").is_err());
        assert!(validate_sender(Chain::Bitcoin, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").is_ok());
        assert!(validate_sender(Chain::Ethereum, "").is_err());
        assert!(validate_sender(Chain::Ethereum, "0xfeed").is_ok());
    }
}
