use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "listing-scanner")]
#[command(about = "Scan marketplace search feeds and notify about new matching listings")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "scanner.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    pub monitor: Option<bool>,

    /// Override the seen-items file path from config
    #[arg(long)]
    pub store: Option<String>,

    /// Show the configured searches without fetching or notifying
    #[arg(long)]
    pub dry_run: bool,

    /// Send one test notification and exit
    #[arg(long, conflicts_with = "dry_run")]
    pub test_notification: bool,
}
