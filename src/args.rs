use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use yield_catalog::{ExportFormat, SourceKind};

#[derive(Parser, Debug)]
#[command(name = "yield-catalog")]
#[command(about = "Scrapes a paginated product listing into a timestamped table")]
#[command(version)]
pub struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listing URL to start from (without the start offset)
    #[arg(short, long)]
    pub listing_url: Option<String>,

    /// How pages are fetched
    #[arg(short, long, value_enum)]
    pub source: Option<SourceArg>,

    /// Number of concurrent detail workers (1-10)
    #[arg(short = 'n', long)]
    pub concurrency: Option<usize>,

    /// Pause between listing page requests, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Directory the output file is written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Output file format
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// WebDriver endpoint for the browser source
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Print the product links and exit without visiting them
    #[arg(long)]
    pub links_only: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Http,
    Browser,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Http => SourceKind::Http,
            SourceArg::Browser => SourceKind::Browser,
        }
    }
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}
