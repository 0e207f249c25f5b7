use std::{process::ExitCode, str::FromStr, sync::Arc};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, WrapErr as _};
use tidepool_core::{
    Asset, Chain, Config, Memo, Thorchain, ThornodeClient, WalletRegistry,
    contracts::AggregatorRegistry,
    memo::basis_points,
    route::{self, QuoteRoute},
};
use tracing::info;

mod telemetry;

#[derive(Parser)]
#[command(name = "tidepool", about = "THORChain transaction construction toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the inbound routing record for a chain
    Inbound {
        /// Chain ticker, e.g. BTC or ETH
        chain: String,
    },

    /// Render a protocol memo
    #[command(subcommand)]
    Memo(MemoCommand),

    /// Classify a quote route (JSON on stdin)
    Classify,
}

#[derive(Subcommand)]
enum MemoCommand {
    /// Liquidity deposit memo
    Deposit {
        /// Pool asset, e.g. BTC.BTC
        asset: String,
        /// Paired address for symmetric adds
        #[arg(long, default_value = "")]
        address: String,
        /// Render the single-sided (savers) form
        #[arg(long)]
        single_side: bool,
    },

    /// Liquidity withdrawal memo
    Withdraw {
        /// Pool asset, e.g. BTC.BTC
        asset: String,
        /// Fraction of the position to withdraw, in [0, 1]
        percent: f64,
        /// Target asset for single-asset payout
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        single_side: bool,
    },

    /// Node bond memo
    Bond { address: String },

    /// Node unbond memo
    Unbond { address: String, amount: u64 },

    /// Node leave memo
    Leave { address: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration:\n{err:?}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing
    let subscriber = telemetry::get_subscriber();
    telemetry::init_subscriber(subscriber);

    if let Err(err) = run(Cli::parse(), config).await {
        eprintln!("{err:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli, config: Config) -> eyre::Result<()> {
    match cli.command {
        Commands::Inbound { chain } => {
            let chain = Chain::from_str(&chain).wrap_err("unrecognized chain ticker")?;
            let thornode = match &config.thornode_url {
                Some(url) => ThornodeClient::with_base_url(url.clone()),
                None => ThornodeClient::new(config.network),
            };
            let aggregators = AggregatorRegistry::from_config(&config.aggregators)
                .wrap_err("invalid aggregator configuration")?;
            let provider = Thorchain::new(WalletRegistry::new(), Arc::new(thornode), aggregators);

            let inbound = provider.get_inbound_data_by_chain(chain).await?;
            info!(%chain, "fetched inbound record");
            println!("{}", serde_json::to_string_pretty(&inbound)?);
        }

        Commands::Memo(command) => {
            let memo = render_memo(command)?;
            println!("{memo}");
        }

        Commands::Classify => {
            let route: QuoteRoute =
                serde_json::from_reader(std::io::stdin()).wrap_err("malformed quote route")?;
            let kind = route::classify(&route)?;
            println!("{kind:?}");
        }
    }
    Ok(())
}

fn render_memo(command: MemoCommand) -> eyre::Result<Memo> {
    let memo = match command {
        MemoCommand::Deposit {
            asset,
            address,
            single_side,
        } => Memo::Deposit {
            asset: Asset::from_str(&asset)?,
            address,
            single_side,
        },
        MemoCommand::Withdraw {
            asset,
            percent,
            target,
            single_side,
        } => Memo::Withdraw {
            asset: Asset::from_str(&asset)?,
            basis_points: basis_points(percent),
            target,
            single_side,
        },
        MemoCommand::Bond { address } => Memo::Bond { address },
        MemoCommand::Unbond { address, amount } => Memo::Unbond {
            address,
            amount: amount.into(),
        },
        MemoCommand::Leave { address } => Memo::Leave { address },
    };
    Ok(memo)
}
