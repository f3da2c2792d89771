//! mintforge command line
//!
//! Reports go to stdout, logs to stderr. Any failure ends the process with a
//! non-zero exit status.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mintforge::amount::{parse_minor_units, LAMPORTS_DECIMALS};
use mintforge::config::{Config, ENV_KEYPAIR, ENV_URL};
use mintforge::flows;
use mintforge::rpc_manager::{LedgerRpc, RpcConnection};
use mintforge::token::{parse_key_value, TokenMetadataSpec, TokenProgram};
use mintforge::wallet::Wallet;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// RPC endpoint URL or cluster name (devnet, testnet, mainnet-beta, localnet)
    #[arg(short, long, global = true, env = ENV_URL)]
    url: Option<String>,

    /// Keypair file of the paying / signing wallet
    #[arg(short, long, global = true, env = ENV_KEYPAIR)]
    keypair: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show native balances (defaults to the wallet's own address)
    Balance {
        addresses: Vec<Pubkey>,
    },
    /// Send native currency from the wallet
    Transfer {
        /// Recipient address
        recipient: Pubkey,
        /// Amount in SOL, fractions allowed (e.g. 1.2)
        amount: String,
    },
    /// Create a mint, the wallet's associated account, and an initial supply
    CreateToken {
        #[arg(long, default_value_t = 9)]
        decimals: u8,
        /// Whole tokens minted to the wallet
        #[arg(long, default_value_t = 0)]
        supply: u64,
        #[arg(long, default_value_t = TokenProgram::Legacy)]
        program: TokenProgram,
    },
    /// Mint whole tokens of an existing mint
    Mint {
        mint: Pubkey,
        amount: u64,
        /// Receiving wallet (defaults to the signer)
        #[arg(long)]
        owner: Option<Pubkey>,
        /// Decimals of the existing mint; the ledger rejects a mismatch
        #[arg(long)]
        decimals: u8,
        #[arg(long, default_value_t = TokenProgram::Legacy)]
        program: TokenProgram,
    },
    /// Create a Token-2022 mint with on-mint metadata
    CreateMetadataToken {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        uri: String,
        /// Additional metadata entry, repeatable
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
        #[arg(long, default_value_t = 6)]
        decimals: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    if let Err(e) = run(args).await {
        error!(error = %format!("{:#}", e), "Command failed");
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let rpc = RpcConnection::new(&config.rpc);
    info!(endpoint = %rpc.endpoint(), "Connected");

    match args.command {
        Command::Balance { addresses } => {
            let addresses = if addresses.is_empty() {
                vec![load_wallet(&config)?.pubkey()]
            } else {
                addresses
            };
            for line in flows::balance::run(&rpc, &addresses).await? {
                println!("{}", line);
            }
        }
        Command::Transfer { recipient, amount } => {
            let wallet = load_wallet(&config)?;
            let lamports = parse_minor_units(&amount, LAMPORTS_DECIMALS)?;
            let report = flows::transfer::run(&rpc, wallet.keypair(), &recipient, lamports).await?;
            println!("{}", report);
        }
        Command::CreateToken {
            decimals,
            supply,
            program,
        } => {
            let wallet = load_wallet(&config)?;
            let report =
                flows::create_token::run(&rpc, wallet.keypair(), decimals, supply, program).await?;
            println!("{}", report);
        }
        Command::Mint {
            mint,
            amount,
            owner,
            decimals,
            program,
        } => {
            let wallet = load_wallet(&config)?;
            let owner = owner.unwrap_or_else(|| wallet.pubkey());
            let report = flows::mint::run(
                &rpc,
                wallet.keypair(),
                &mint,
                &owner,
                amount,
                decimals,
                program,
            )
            .await?;
            println!("{}", report);
        }
        Command::CreateMetadataToken {
            name,
            symbol,
            uri,
            fields,
            decimals,
        } => {
            let wallet = load_wallet(&config)?;
            let spec = TokenMetadataSpec {
                name,
                symbol,
                uri,
                additional: fields,
            };
            let report =
                flows::token_metadata::run(&rpc, wallet.keypair(), &spec, decimals).await?;
            println!("{}", report);
        }
    }

    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        "mintforge=debug,info"
    } else {
        "mintforge=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}

/// Config file, then environment, then flags
fn load_config(args: &Args) -> Result<Config> {
    let config = Config::from_file_with_env(args.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(args.url.clone(), args.keypair.clone());
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn load_wallet(config: &Config) -> Result<Wallet> {
    info!("Loading wallet from: {}", config.wallet.keypair_path);
    let wallet = Wallet::from_file(&config.wallet.keypair_path).context("Failed to load wallet")?;
    info!("Wallet address: {}", wallet.pubkey());
    Ok(wallet)
}
