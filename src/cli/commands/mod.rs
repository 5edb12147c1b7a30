//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod helpers;
mod init;
mod scrape;
mod selectors;
mod whoami;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "lodebot")]
#[command(about = "Lodestone scraper and character verification")]
#[command(version)]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(short, long, global = true, env = "LODEBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Lodestone region (overrides config and LODESTONE_REGION)
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Scrape a selector address for a Lodestone entity
    Scrape {
        /// Selector address: category[.file[.key...]] (e.g. profile.character.NAME)
        selector: String,
        /// Entity id (character, free company or PvP team id)
        entity_id: String,
        /// Extra ids for templates with more slots
        extra_ids: Vec<String>,
        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Browse the selector catalog
    Selectors {
        /// Category to list files of
        category: Option<String>,
        /// File to list keys of
        file: Option<String>,
        /// List every category.file.key address
        #[arg(short, long)]
        all: bool,
    },

    /// Link Discord users to Lodestone characters
    Whoami {
        #[command(subcommand)]
        command: WhoamiCommands,
    },
}

#[derive(Subcommand)]
enum WhoamiCommands {
    /// Issue a verification token
    Create {
        /// Discord user id
        discord_id: u64,
    },
    /// Confirm a character by reading the token back from its profile
    Verify {
        /// Discord user id
        discord_id: u64,
        /// Lodestone character id
        lodestone_id: String,
        /// Token to check against the pending one
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Show the character linked to a Discord user
    View {
        /// Discord user id
        discord_id: u64,
        /// Show every linked character
        #[arg(short, long)]
        all: bool,
    },
    /// Show whether a verification is pending
    Status {
        /// Discord user id
        discord_id: u64,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(region) = cli.region {
        settings.region = region;
    }

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Scrape {
            selector,
            entity_id,
            extra_ids,
            compact,
        } => scrape::cmd_scrape(&settings, &selector, &entity_id, &extra_ids, compact).await,
        Commands::Selectors {
            category,
            file,
            all,
        } => selectors::cmd_selectors(&settings, category.as_deref(), file.as_deref(), all),
        Commands::Whoami { command } => match command {
            WhoamiCommands::Create { discord_id } => {
                whoami::cmd_create(&settings, discord_id).await
            }
            WhoamiCommands::Verify {
                discord_id,
                lodestone_id,
                token,
            } => whoami::cmd_verify(&settings, discord_id, &lodestone_id, token.as_deref()).await,
            WhoamiCommands::View { discord_id, all } => {
                whoami::cmd_view(&settings, discord_id, all).await
            }
            WhoamiCommands::Status { discord_id } => {
                whoami::cmd_status(&settings, discord_id).await
            }
        },
    }
}
