//! Read-only balance viewer: resolves the configured watch-only addresses
//! on every chain and prints the aggregated asset list.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use wallet_session::balance::{AssetBalance, FetchState};
use wallet_session::config::{ApiCredential, LogFormat, WalletConfig};
use wallet_session::logging::init_logging;
use wallet_session::types::{ChainFamily, NetworkId};
use wallet_session::watch_only::WatchOnlyFactory;
use wallet_session::{AppContext, WalletError};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Active network, e.g. `ethereum-sepolia`
    #[arg(long, short)]
    network: Option<NetworkId>,

    /// Solana address to watch
    #[arg(long)]
    solana: Option<String>,

    /// Address to watch on Ethereum, Polygon and Base
    #[arg(long)]
    evm: Option<String>,

    /// Bitcoin address to watch
    #[arg(long)]
    bitcoin: Option<String>,

    /// Print the asset list as JSON
    #[arg(long)]
    json: bool,

    /// Log output format (text or json)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

fn state_label(balance: &AssetBalance) -> &'static str {
    match balance.fetch_state {
        FetchState::Idle => "-",
        FetchState::Loading => "loading",
        FetchState::Ready => "ok",
        FetchState::Error => "error",
    }
}

async fn run(args: Args) -> Result<(), WalletError> {
    let mut config = WalletConfig::load(args.config.as_deref())?;
    if let Some(network) = args.network {
        config.network = network;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
    for (family, address) in [
        (ChainFamily::Solana, args.solana),
        (ChainFamily::Evm, args.evm),
        (ChainFamily::Bitcoin, args.bitcoin),
    ] {
        if let Some(address) = address {
            config.watch_only.insert(family, address);
        }
    }
    init_logging(&config.logging)?;

    if config.watch_only.is_empty() {
        return Err(WalletError::Config(
            "no addresses to watch (use --solana, --evm, --bitcoin or [watch_only])".into(),
        ));
    }

    let factory = Arc::new(WatchOnlyFactory::new(config.watch_only.clone()));
    let ctx = AppContext::from_config(&config, factory, ApiCredential::anonymous())?;
    ctx.startup();
    ctx.sync().await;

    let balances = ctx.asset_list();
    if args.json {
        let text = serde_json::to_string_pretty(&balances)
            .map_err(|e| WalletError::Config(format!("cannot encode balances: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    println!("Active network: {}", ctx.active_network_config()?.display_name);
    for balance in balances.iter().filter(|b| b.fetch_state != FetchState::Idle) {
        let address = ctx.address(balance.chain).unwrap_or_default();
        println!(
            "{:<9} {:<6} {:>22}  {:<5} {}",
            balance.chain.display_name(),
            balance.symbol,
            balance.display_amount(),
            state_label(balance),
            address
        );
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "wallet-balances failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
