use std::path::PathBuf;

use burry_client::{load_client_config, EscrowAgent};
use clap::{Parser, Subcommand, ValueHint};
use tracing_subscriber::EnvFilter;

const DEFAULT_CLIENT_CONFIG_PATH: &str = "./client_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = load_client_config(&cli.config)?;
    let agent = EscrowAgent::new(&config)?;

    match cli.command {
        Commands::Deposit {
            amount,
            unlock_price,
        } => {
            let signature = agent.deposit(amount, unlock_price).await?;
            tracing::info!(%signature, "Escrow created successfully");
        }
        Commands::Withdraw => {
            let signature = agent.withdraw().await?;
            tracing::info!(%signature, "Escrow withdrawn successfully");
        }
        Commands::WithdrawClosedFeed => {
            let signature = agent.withdraw_closed_feed().await?;
            tracing::info!(%signature, "Escrow withdrawn from closed feed");
        }
        Commands::Show => match agent.fetch_escrow().await? {
            Some((pda, record, lamports)) => {
                println!("Escrow account:   {pda}");
                println!("Owner:            {}", record.owner);
                println!("Onchain unlock price: {}", record.unlock_price);
                println!("Amount in escrow: {}", record.balance);
                println!("Account lamports: {lamports}");
            }
            None => {
                let (pda, _) = agent.escrow_address()?;
                println!("No escrow at {pda}");
            }
        },
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "burry-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long,
        global = true,
        value_parser,
        default_value = DEFAULT_CLIENT_CONFIG_PATH,
        value_hint = ValueHint::FilePath)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lock lamports until the feed price rises above `unlock_price`
    Deposit {
        #[arg(short, long)]
        amount: u64,

        #[arg(short, long)]
        unlock_price: u64,
    },
    /// Reclaim the escrow once the price condition holds
    Withdraw,
    /// Reclaim the escrow after the feed account has been closed
    WithdrawClosedFeed,
    /// Print the payer's escrow account
    Show,
}
