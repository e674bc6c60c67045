use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitewatch")]
#[command(about = "Detects file and database drift between scheduled scans")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.config/sitewatch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Capture the current state, report drift and advance the baseline
    Scan(ScanArgs),

    /// Show what the stored baseline contains
    Baseline(BaselineArgs),
}

#[derive(Parser, Default)]
pub struct ScanArgs {
    /// Directory tree to monitor (overrides monitor_dir)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// SQLite database to monitor (overrides database.path)
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Where the baseline is kept (overrides state_file)
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Overall time budget, e.g. "10m" (overrides time_budget)
    #[arg(long)]
    pub time_budget: Option<String>,

    /// Print the report instead of mailing it and leave the baseline alone
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Parser, Default)]
pub struct BaselineArgs {
    /// Where the baseline is kept (overrides state_file)
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// List every tracked file and table
    #[arg(long, default_value_t = false)]
    pub full: bool,
}
