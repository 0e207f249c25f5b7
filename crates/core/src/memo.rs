use std::fmt::{self, Display};

use num_bigint::BigUint;

use crate::{asset::Asset, chain::Chain};

/// Converts a withdrawal fraction in `[0, 1]` to protocol basis points,
/// clamped to `[0, 10000]`.
pub fn basis_points(fraction: f64) -> u32 {
    (fraction * 10_000.0).round().clamp(0.0, 10_000.0) as u32
}

/// Canonical protocol memo. Rendering is total: optional fields that are
/// absent are simply left out, never rejected. Field order and the `:`
/// separator are parsed positionally by chain-level consensus, so every
/// variant's shape is fixed.
#[derive(Debug, Clone, PartialEq)]
pub enum Memo {
    /// `DEPOSIT:CHAIN.SYMBOL:ADDRESS`, or `DEPOSIT:CHAIN/SYMBOL` for
    /// single-sided (savings) deposits. The address may be empty, which
    /// leaves a trailing separator.
    Deposit {
        asset: Asset,
        address: String,
        single_side: bool,
    },
    /// `WITHDRAW:CHAIN.SYMBOL:BASISPOINTS[:TARGETASSET]`, or
    /// `WITHDRAW:CHAIN/SYMBOL:BASISPOINTS` for single-sided withdrawals.
    Withdraw {
        asset: Asset,
        basis_points: u32,
        target: Option<String>,
        single_side: bool,
    },
    /// `BOND:ADDRESS`
    Bond { address: String },
    /// `UNBOND:ADDRESS:AMOUNT` (amount in base units)
    Unbond { address: String, amount: BigUint },
    /// `LEAVE:ADDRESS`
    Leave { address: String },
    /// `$+:ASSET:ADDRESS[:MINAMOUNT]`
    OpenLoan {
        asset: String,
        address: String,
        min_amount: Option<String>,
    },
    /// `$-:ASSET:ADDRESS[:MINAMOUNT]`
    CloseLoan {
        asset: String,
        address: String,
        min_amount: Option<String>,
    },
    /// `~:NAME:CHAIN:ADDRESS[:OWNER]`
    ThornameRegister {
        name: String,
        chain: Chain,
        address: String,
        owner: Option<String>,
    },
}

impl Display for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Memo::Deposit {
                asset,
                address,
                single_side,
            } => {
                if *single_side {
                    write!(f, "DEPOSIT:{}/{}", asset.chain, asset.symbol)
                } else {
                    write!(f, "DEPOSIT:{}.{}:{}", asset.chain, asset.symbol, address)
                }
            }
            Memo::Withdraw {
                asset,
                basis_points,
                target,
                single_side,
            } => {
                if *single_side {
                    write!(f, "WITHDRAW:{}/{}:{}", asset.chain, asset.symbol, basis_points)
                } else {
                    write!(f, "WITHDRAW:{}.{}:{}", asset.chain, asset.symbol, basis_points)?;
                    if let Some(target) = target {
                        write!(f, ":{target}")?;
                    }
                    Ok(())
                }
            }
            Memo::Bond { address } => write!(f, "BOND:{address}"),
            Memo::Unbond { address, amount } => write!(f, "UNBOND:{address}:{amount}"),
            Memo::Leave { address } => write!(f, "LEAVE:{address}"),
            Memo::OpenLoan {
                asset,
                address,
                min_amount,
            } => {
                write!(f, "$+:{asset}:{address}")?;
                if let Some(min) = min_amount {
                    write!(f, ":{min}")?;
                }
                Ok(())
            }
            Memo::CloseLoan {
                asset,
                address,
                min_amount,
            } => {
                write!(f, "$-:{asset}:{address}")?;
                if let Some(min) = min_amount {
                    write!(f, ":{min}")?;
                }
                Ok(())
            }
            Memo::ThornameRegister {
                name,
                chain,
                address,
                owner,
            } => {
                write!(f, "~:{name}:{chain}:{address}")?;
                if let Some(owner) = owner {
                    write!(f, ":{owner}")?;
                }
                Ok(())
            }
        }
    }
}
