//! CLI argument definitions for riskmatrix.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `compute` | Download series, build the risk matrix, write snapshots |
//! | `classify` | Build the risk matrix from a local series file |
//! | `catalog` | List or edit a series catalog file |
//! | `indicators` | Show indicator definitions and their tables |
//! | `sources` | Show provider health and policies |
//! | `publish` | Upload the dated and latest snapshots |
//!
//! # Examples
//!
//! ```bash
//! # Offline run with synthetic series
//! riskmatrix compute --mock --pretty
//!
//! # Classify a saved series file
//! riskmatrix classify --input series.json --output-dir data
//!
//! # Publish today's snapshots into a mounted bucket
//! riskmatrix publish --target-dir /mnt/bucket
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Macro-financial risk matrix: regime classification for a fixed indicator panel.
#[derive(Debug, Parser)]
#[command(
    name = "riskmatrix",
    author,
    version,
    about = "Macro-financial regime classification and risk matrix snapshots",
    long_about = "riskmatrix downloads a panel of market and macro series from FRED and \
Yahoo Finance, classifies each indicator into a regime with its threshold table and \
writes a dated risk-matrix JSON snapshot plus a rolling latest file.\n\
\n\
Logs go to stderr; set RUST_LOG to change verbosity."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download every catalog series and write the risk-matrix snapshots.
    ///
    /// # Examples
    ///
    ///   riskmatrix compute
    ///   riskmatrix compute --mock --output-dir /tmp/data --print
    Compute(ComputeArgs),
    /// Classify series from a local JSON file instead of downloading them.
    ///
    /// The file maps symbols to observation lists:
    /// {"VIXCLS": [{"date": "2024-06-28", "value": 12.4}, ...]}
    Classify(ClassifyArgs),
    /// Inspect or edit a catalog file.
    Catalog(CatalogArgs),
    /// List indicator definitions with their threshold tables.
    Indicators,
    /// Show provider health, rate budget and download policy.
    Sources(SourcesArgs),
    /// Publish the dated and latest snapshot files.
    Publish(PublishArgs),
}

/// Arguments for the `compute` command.
#[derive(Debug, Args)]
pub struct ComputeArgs {
    /// Serve deterministic synthetic series instead of calling providers.
    #[arg(long, default_value_t = false)]
    pub mock: bool,

    /// Snapshot directory (overrides RISKMATRIX_OUTPUT_DIR).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Catalog JSON file (overrides RISKMATRIX_CATALOG).
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Calendar days of history to download (overrides RISKMATRIX_LOOKBACK_DAYS).
    #[arg(long)]
    pub lookback_days: Option<u32>,

    /// Include the whole matrix in the command output.
    #[arg(long, default_value_t = false)]
    pub print: bool,
}

/// Arguments for the `classify` command.
#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Series JSON file.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Also write snapshot files into this directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the `catalog` command.
#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Catalog JSON file; listing falls back to the built-in catalog when missing.
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// Print every catalog entry.
    List,
    /// Add or replace an entry.
    ///
    /// # Examples
    ///
    ///   riskmatrix catalog add DGS30 --name "30年期美债收益率" --source fred
    ///   riskmatrix catalog add T10Y2Y --name "10Y-2Y" --minuend DGS10 --subtrahend DGS2
    Add(CatalogAddArgs),
    /// Remove an entry.
    Remove(CatalogRemoveArgs),
}

#[derive(Debug, Args)]
pub struct CatalogAddArgs {
    pub symbol: String,

    /// Display name used as the report's indicator name.
    #[arg(long)]
    pub name: String,

    /// Provider to download from; omit for a derived spread.
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    #[arg(long, value_enum, default_value_t = FrequencyArg::Daily)]
    pub frequency: FrequencyArg,

    /// First leg of a derived spread.
    #[arg(long, requires = "subtrahend", conflicts_with = "source")]
    pub minuend: Option<String>,

    /// Second leg of a derived spread.
    #[arg(long, requires = "minuend")]
    pub subtrahend: Option<String>,
}

#[derive(Debug, Args)]
pub struct CatalogRemoveArgs {
    pub symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Fred,
    Yahoo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FrequencyArg {
    Daily,
    Weekly,
    Monthly,
}

/// Arguments for the `sources` command.
#[derive(Debug, Args)]
pub struct SourcesArgs {
    /// Report mock adapters instead of real ones.
    #[arg(long, default_value_t = false)]
    pub mock: bool,
}

/// Arguments for the `publish` command.
#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Directory holding the snapshot files.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Snapshot date (YYYY-MM-DD); defaults to the date in the latest file.
    #[arg(long)]
    pub date: Option<String>,

    /// Copy into this directory instead of uploading over HTTP.
    #[arg(long)]
    pub target_dir: Option<PathBuf>,
}
