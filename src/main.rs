//! # Land Registry CLI (`landreg`)
//!
//! The `landreg` binary builds the local ownership store from the two bulk
//! extracts and answers lookups against it.
//!
//! ## Usage
//!
//! ```bash
//! landreg --config ./config/registry.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `landreg init` | Create the SQLite database and empty relations |
//! | `landreg build` | Rebuild titles, owners and links from both extracts |
//! | `landreg title <number>` | Show a title and its owners |
//! | `landreg owner <name>` | Show an owner and the titles it holds |
//! | `landreg complete <prefix>` | Owner-name autocomplete |
//! | `landreg stats` | Store counts and last build time |
//! | `landreg export` | Dump owner names as JSON |
//!
//! ## Examples
//!
//! ```bash
//! # Rebuild from the configured extracts
//! landreg build
//!
//! # Rebuild from explicit files, reporting progress as JSON lines
//! landreg build --domestic ./data/CCOD_FULL.zip --overseas ./data/OCOD_FULL.zip --progress json
//!
//! # Look up a title as JSON
//! landreg title AB123 --json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use land_registry::progress::ProgressMode;
use land_registry::{config, export, ingest, logging, migrate, query, stats};

/// Land Registry CLI: local ownership lookups over the CCOD and OCOD
/// bulk extracts.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/registry.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "landreg",
    about = "Land Registry: build and query a local store of property titles and their corporate owners",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/registry.toml")]
    config: PathBuf,

    /// Enable debug logging on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the titles, owners and
    /// titles_owners relations. Running it on an existing store is a no-op.
    Init,

    /// Rebuild the store from both extracts.
    ///
    /// Reads the domestic and overseas extracts (CSV or ZIP), normalizes
    /// owners, and replaces all three relations in one transaction. A failed
    /// build leaves the previous store untouched.
    Build {
        /// Domestic (CCOD) extract; overrides `datasets.domestic`.
        #[arg(long)]
        domestic: Option<PathBuf>,

        /// Overseas (OCOD) extract; overrides `datasets.overseas`.
        #[arg(long)]
        overseas: Option<PathBuf>,

        /// Progress reporting on stderr: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a terminal.
        #[arg(long)]
        progress: Option<ProgressMode>,
    },

    /// Look up a title by its title number.
    Title {
        /// Title number, matched after canonicalization.
        title_number: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Look up an owner by name.
    Owner {
        /// Owner name, matched after canonicalization.
        name: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Complete an owner-name prefix (case-insensitive).
    Complete {
        prefix: String,

        /// Maximum suggestions; defaults to `search.autocomplete_limit`.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show store statistics.
    Stats,

    /// Export all owner names as JSON.
    Export {
        /// Output file. Prints to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Build {
            domestic,
            overseas,
            progress,
        } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            ingest::run_build(&cfg, domestic, overseas, mode).await?;
        }
        Commands::Title { title_number, json } => {
            query::run_title(&cfg, &title_number, json).await?;
        }
        Commands::Owner { name, json } => {
            query::run_owner(&cfg, &name, json).await?;
        }
        Commands::Complete { prefix, limit } => {
            query::run_complete(&cfg, &prefix, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
    }

    Ok(())
}
