mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pronord")]
#[command(about = "Pronoun badge backend: credential relay, bio fetch, pronoun cache", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch bios for handles and cache any pronouns found
    Lookup {
        /// Bearer token (as it appears on the Authorization header)
        #[arg(long)]
        bearer: String,

        /// CSRF token (the session cookie value)
        #[arg(long)]
        csrf: String,

        /// Handles to look up, without the leading @
        #[arg(required = true)]
        handles: Vec<String>,
    },

    /// Inspect or maintain the pronoun cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Print cached pronouns (all, or one handle)
    Show { handle: Option<String> },

    /// Evict oldest entries down to the configured ceiling
    Sweep,

    /// Drop every cached entry
    Clear,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Lookup {
            bearer,
            csrf,
            handles,
        } => {
            commands::lookup::run(&bearer, &csrf, &handles).await?;
        }
        Commands::Cache { command } => match command {
            CacheCommands::Show { handle } => {
                commands::cache_cmd::show(handle.as_deref())?;
            }
            CacheCommands::Sweep => {
                commands::cache_cmd::sweep()?;
            }
            CacheCommands::Clear => {
                commands::cache_cmd::clear()?;
            }
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                commands::config_cmd::show()?;
            }
            ConfigCommands::Init { force } => {
                commands::config_cmd::init(force)?;
            }
        },
    }

    Ok(())
}
