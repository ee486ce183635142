//! # Wallet Doctor
//!
//! Diagnostic utility for the wallet layer.
//!
//! ## Usage
//!
//! ```bash
//! # Which backend would this page get?
//! cargo run --package wallet-doctor --bin wallet_doctor -- detect \
//!     --url "https://evermarks.net/?miniApp=true" --cross-origin
//!
//! # Is the RPC endpoint reachable and what is the allowance?
//! cargo run --package wallet-doctor --bin wallet_doctor -- allowance <token> <owner> <spender>
//!
//! # Print the effective configuration
//! cargo run --package wallet-doctor --bin wallet_doctor -- config
//! ```

use alloy_primitives::Address;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lib_core::config::{core_config, init_config};
use lib_core::logging::{init_tracing, DEFAULT_FILTER};
use lib_core::WalletConfig;
use lib_wallet::erc20;
use lib_wallet::{ContractReader, EnvironmentDetector, EnvironmentSignals, FrameRelation, JsonRpcReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Diagnostics for the Evermarks wallet layer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show which wallet backend a page with these signals would get.
    Detect(DetectArgs),
    /// Read an ERC-20 allowance through the configured RPC endpoint.
    Allowance {
        /// ERC-20 token contract
        token: Address,
        /// Account that granted the allowance
        owner: Address,
        /// Account allowed to spend
        spender: Address,
    },
    /// Print the effective configuration.
    Config,
}

#[derive(Args, Debug, Default)]
struct DetectArgs {
    /// Page URL as the browser reports it
    #[arg(long)]
    url: Option<String>,

    /// Document referrer
    #[arg(long)]
    referrer: Option<String>,

    /// Navigator user agent
    #[arg(long)]
    user_agent: Option<String>,

    /// The host's bootstrap script marked the page
    #[arg(long)]
    host_flag: bool,

    /// Page is framed by a different origin
    #[arg(long, conflicts_with = "same_origin")]
    cross_origin: bool,

    /// Page is framed by its own origin
    #[arg(long)]
    same_origin: bool,
}

impl DetectArgs {
    fn into_signals(self) -> EnvironmentSignals {
        let frame = if self.cross_origin {
            FrameRelation::CrossOriginFrame
        } else if self.same_origin {
            FrameRelation::SameOriginFrame
        } else {
            FrameRelation::TopLevel
        };

        EnvironmentSignals {
            injected_host_flag: self.host_flag,
            page_url: self.url,
            referrer: self.referrer,
            user_agent: self.user_agent,
            frame,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_tracing(DEFAULT_FILTER);

    match cli.command {
        Command::Detect(args) => {
            detect(args);
            Ok(())
        }
        Command::Allowance { token, owner, spender } => {
            let config = load_config()?;
            allowance(config, token, owner, spender).await
        }
        Command::Config => {
            print_config(load_config()?);
            Ok(())
        }
    }
}

fn load_config() -> anyhow::Result<&'static WalletConfig> {
    init_config().context("Invalid wallet configuration")?;
    let config = core_config();
    info!(rpc_url = %config.rpc_url, chain_id = config.chain_id, "Wallet configuration loaded");
    Ok(config)
}

fn detect(args: DetectArgs) {
    let detector = EnvironmentDetector::new(args.into_signals());
    let verdict = detector.detect();

    println!("============================================");
    println!("  Environment Detection");
    println!("============================================");
    println!();
    println!(
        "Backend:    {}",
        if verdict.use_host_backend { "host frame" } else { "injected (standalone)" }
    );
    println!("Confidence: {:?}", verdict.confidence);
    if verdict.matched_signals.is_empty() {
        println!("Signals:    none");
    } else {
        println!("Signals:    {}", verdict.signal_names().join(", "));
    }
}

async fn allowance(config: &WalletConfig, token: Address, owner: Address, spender: Address) -> anyhow::Result<()> {
    let reader = JsonRpcReader::new(&config.rpc_url)?;

    println!("Querying {} ...", reader.url());
    let output = reader
        .call(token, erc20::encode_allowance(owner, spender))
        .await
        .context("eth_call failed")?;
    let allowance = erc20::decode_allowance(&output)?;

    println!();
    println!("Token:     {token}");
    println!("Owner:     {owner}");
    println!("Spender:   {spender}");
    println!("Allowance: {allowance}");

    Ok(())
}

fn print_config(config: &WalletConfig) {
    let show = |address: Option<Address>| address.map_or_else(|| "not set".to_string(), |a| a.to_string());

    println!("RPC URL:               {}", config.rpc_url);
    println!("Chain id:              {}", config.chain_id);
    println!("Auto-connect attempts: {}", config.max_auto_connect_attempts);
    println!("Connect retry delay:   {:?}", config.connect_retry_delay);
    println!("Connect timeout:       {:?}", config.connect_timeout);
    println!("Transaction timeout:   {:?}", config.transaction_timeout);
    println!("Host context timeout:  {:?}", config.host_context_timeout);
    println!("Batch delay:           {:?}", config.batch_delay);
    println!();
    println!("EMARK token:           {}", show(config.contracts.emark_token));
    println!("WEMARK:                {}", show(config.contracts.wemark));
    println!("Voting:                {}", show(config.contracts.voting));
    println!("Rewards:               {}", show(config.contracts.rewards));
}
