//! Transaction construction and routing for THORChain-style cross-chain
//! swaps. The dispatcher turns typed intents (swap, liquidity, savings,
//! loans, node operations) into protocol memos and chain-family call shapes,
//! then hands exactly one prepared send to the wallet adapter for the
//! signing chain.

pub mod asset;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod memo;
pub mod provider;
pub mod route;
pub mod thornode;
pub mod tx;
pub mod wallet;

pub use asset::{Asset, AssetAmount};
pub use chain::Chain;
pub use config::{Config, Network};
pub use error::SwapError;
pub use memo::Memo;
pub use provider::Thorchain;
pub use route::{QuoteMode, QuoteRoute, RouteKind};
pub use thornode::{ThornodeApi, ThornodeClient};
pub use wallet::{FeeOption, WalletAdapter, WalletRegistry};
