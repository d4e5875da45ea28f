//! CardSense CLI: the main entry point.
//!
//! Commands:
//! - `serve`      Start the HTTP gateway
//! - `chat`       Interactive chat or single-message mode
//! - `provision`  Resolve (or create) the knowledge base now
//! - `init`       Write a default config and system prompt
//! - `status`     Show effective configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "cardsense",
    about = "CardSense: credit card assistant backed by a hosted knowledge base",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Resolve the knowledge base, creating and filling it if needed
    Provision,

    /// Write a default config file and system prompt
    Init,

    /// Show effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Provision => commands::provision::run().await?,
        Commands::Init => commands::init::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
