//! MythicMarket CLI - Test orders and delivery probes.
//!
//! # Usage
//!
//! ```bash
//! # Build up a cart in the local state file
//! mm-cli cart add --id amulet-1 --name "Cursed Amulet" --price 19.99 --quantity 2
//! mm-cli cart show
//!
//! # Submit the cart as an order through the gateway
//! mm-cli order send --gateway http://localhost:8787 --secret "$GATEWAY_SHARED_SECRET" \
//!     --name "Morgan Vale" --email morgan@example.com --handle morganvale
//!
//! # Preview the confirmation email without sending anything
//! mm-cli order render-email --name "Morgan Vale" --email morgan@example.com --handle morganvale
//!
//! # Check whether a Discord handle can receive order DMs
//! mm-cli probe --gateway http://localhost:8787 --secret "$GATEWAY_SHARED_SECRET" --handle morganvale
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};

mod commands;

use commands::{cart::CartAction, order::OrderAction, probe::ProbeArgs};

#[derive(Parser)]
#[command(name = "mm-cli")]
#[command(author, version, about = "MythicMarket CLI tools")]
struct Cli {
    /// Path of the local state file (cart + checkout draft)
    #[arg(long, global = true, default_value = ".mm-state.json")]
    state: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the locally persisted cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Build and submit orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Probe whether a Discord handle is reachable
    Probe(ProbeArgs),
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => commands::cart::run(&cli.state, action),
        Commands::Order { action } => commands::order::run(&cli.state, action).await,
        Commands::Probe(args) => commands::probe::run(args).await,
    }
}
