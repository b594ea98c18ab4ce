//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "polidex",
    version,
    about = "Hybrid retrieval engine for internal policy documents",
    long_about = "Polidex answers natural-language questions against a corpus of internal \
                  policy documents. It combines structured-entity lookup, tree reasoning \
                  through an external call, and keyword/chunk scoring, then fuses the \
                  candidates into a ranked, deduplicated top-K result."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/polidex/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve the most relevant passages for a question
    Query {
        /// Question text
        query: String,

        /// Maximum number of chunks to return (defaults to the configured top_k)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Restrict retrieval to a single document id
        #[arg(short, long)]
        doc: Option<String>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,

        /// Skip the external reasoning call even when configured
        #[arg(long)]
        offline: bool,
    },

    /// List loaded documents, or print one document in full
    Docs {
        /// Document id to print in full
        id: Option<String>,
    },

    /// Show loaded index counts and the active retrieval mode
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
