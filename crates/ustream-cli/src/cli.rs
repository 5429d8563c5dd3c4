use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ustream",
    about = "Update Stream: merge versioned changes into record streams",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge a change file into an NDJSON record stream
    Merge(MergeArgs),
    /// Validate a merge configuration file
    Check(CheckArgs),
}

#[derive(Args)]
pub struct MergeArgs {
    /// Change file: a JSON array of records, or NDJSON (.ndjson / .jsonl)
    #[arg(long)]
    pub changes: PathBuf,
    /// NDJSON input; defaults to stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// NDJSON output; defaults to stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// TOML merge configuration; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub key_field: Option<String>,
    #[arg(long)]
    pub version_field: Option<String>,
    /// Treat input and output lines as batches of records
    #[arg(long)]
    pub batches: bool,
    /// Require an explicit version field
    #[arg(long)]
    pub strict: bool,
    /// Do not print the merge summary
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(short, long)]
    pub config: PathBuf,
}
