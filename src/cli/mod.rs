// CLI module for langstats
// Author: kelexine (https://github.com/kelexine)

use clap::{Parser, ValueEnum};

/// langstats - GitHub language statistics cards with a two-tier cache
#[derive(Parser, Debug)]
#[command(name = "langstats", version, about, long_about = None)]
pub struct Args {
    /// Configuration file (defaults to ~/.langstats/config.toml)
    #[arg(short, long, env = "LANGSTATS_CONFIG")]
    pub config: Option<String>,

    /// Render the languages of this account to stdout and exit
    #[arg(long, value_name = "USERNAME")]
    pub render: Option<String>,

    /// Output format for --render
    #[arg(long, value_enum, default_value_t = OutputFormat::Svg)]
    pub format: OutputFormat,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Svg,
    Json,
}
