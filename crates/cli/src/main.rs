//! TravelGuide CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP/WebSocket gateway
//! - `guide`: Generate one structured travel guide
//! - `chat`: Stream a travel answer to stdout
//! - `tiers`: Show the budget tier table
//! - `doctor`: Check config and backend reachability
//! - `config`: Inspect or initialise configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "travelguide",
    about = "TravelGuide — LLM-backed travel guides and travel chat",
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
    /// Start the HTTP/WebSocket gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate a structured travel guide and print it as JSON
    Guide(commands::guide::GuideArgs),

    /// Ask a travel question and stream the Markdown answer
    Chat {
        /// The question to ask
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Show budget tiers and what each one includes
    Tiers,

    /// Check configuration and backend reachability
    Doctor,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the configuration and print a summary
    Validate,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
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
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Guide(args) => commands::guide::run(args).await?,
        Commands::Chat { question } => commands::chat::run(question.join(" ")).await?,
        Commands::Tiers => commands::tiers::run(),
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate()?,
            ConfigAction::Path => commands::config_cmd::path(),
            ConfigAction::Init => commands::config_cmd::init()?,
        },
    }

    Ok(())
}
