use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ga4-reports — batch GA4 reports into typed tables
#[derive(Parser)]
#[command(name = "ga4-reports", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every configured report and print the tables as JSON
    Run {
        #[command(flatten)]
        target: Target,

        /// Service-account key file (overrides GOOGLE_APPLICATION_CREDENTIALS)
        #[arg(long)]
        credentials: Option<PathBuf>,

        /// Keep the reports that line up when the service returns fewer than requested
        #[arg(long)]
        allow_partial: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the batch request body without sending it
    Plan {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args)]
pub struct Target {
    /// Report configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// GA4 property id (overrides GA4_PROPERTY_ID)
    #[arg(long)]
    pub property_id: Option<String>,

    /// First day of the range, YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day of the range, YYYY-MM-DD
    #[arg(long)]
    pub end_date: Option<String>,
}
