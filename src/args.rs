use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "blogrank",
    about = "Compare search volume and rankings of a domain's blog against the rest of the site",
    version,
    long_about = None
)]
pub struct Args {
    /// Keyword rankings CSV (overrides the config file)
    #[arg(short, long)]
    pub keywords: Option<PathBuf>,

    /// Blog URL inventory CSV (overrides the config file)
    #[arg(short, long)]
    pub blog_urls: Option<PathBuf>,

    /// Domain to analyze (defaults to the first domain in the keyword file)
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Only count blog URLs published in this year
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write blogrank.toml with the default settings
    #[arg(long)]
    pub init: bool,

    /// List the domains present in the keyword file
    #[arg(long)]
    pub list_domains: bool,

    /// List publication years available for the selected domain
    #[arg(long)]
    pub list_years: bool,

    /// Summarize every domain instead of a single one
    #[arg(long)]
    pub all: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Fail on keyword rows with missing or non-numeric position/volume
    #[arg(long)]
    pub strict: bool,

    /// Pick domain and year from prompts and keep the data loaded between reports
    #[arg(short, long)]
    pub interactive: bool,

    /// Number of worker threads for --all
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Redact domain names for privacy
    #[arg(long)]
    pub redact: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
