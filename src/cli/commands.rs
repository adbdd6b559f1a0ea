use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "keyhound")]
#[command(version, about = "Detect and verify leaked AI provider credentials in repositories", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan local directories or remote repository URLs for credentials
    Scan {
        /// Targets: local paths and/or repository URLs
        #[arg(required = true)]
        targets: Vec<String>,

        /// Probe each finding's liveness against the provider API
        #[arg(long)]
        validate: bool,

        /// Output format (table, json, sarif)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated provider names to scan for (default: all)
        #[arg(short, long)]
        providers: Option<String>,

        /// Lines of context captured around each finding
        #[arg(long)]
        context_lines: Option<usize>,
    },

    /// Probe a single key against its provider
    TestKey {
        /// Provider name (e.g. openai, anthropic)
        #[arg(short, long)]
        provider: String,

        /// The key to probe
        key: String,
    },

    /// List registered providers and their patterns
    List,
}
