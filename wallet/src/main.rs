use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use btclib::config::Config;
use btclib::key_provider;

mod core;
use core::Core;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Node address to connect to
    #[arg(short, long, value_name = "ADDRESS", env = "WALLET_NODE_ADDRESS", default_value = "127.0.0.1:6001")]
    node: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print this wallet's address
    Address,
    /// Print this wallet's confirmed balance
    Balance,
    /// List this wallet's unspent outputs
    ListUnspent,
    /// Build, sign, and submit a transaction
    Send {
        /// recipient address (130-char hex)
        to: String,
        /// amount to send
        amount: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::global();
    let private_key = key_provider::load_or_generate(&config.private_key_location)
        .context("failed to load or generate the wallet's private key")?;
    let core = Core::new(private_key, cli.node);

    match cli.command {
        Commands::Address => {
            println!("{}", core.address());
        }
        Commands::Balance => {
            println!("{}", core.balance().await?);
        }
        Commands::ListUnspent => {
            for (tx_out_id, tx_out_index, amount) in core.list_unspent().await? {
                println!("{tx_out_id}:{tx_out_index} {amount}");
            }
        }
        Commands::Send { to, amount } => {
            let tx = core.send(&to, amount).await?;
            println!("submitted transaction {}", tx.id);
        }
    }
    Ok(())
}
