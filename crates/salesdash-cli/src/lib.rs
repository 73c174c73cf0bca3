//! Shared CLI definitions for salesdash.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::Path;

/// Compression format for data files
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Gzip compression (.gz) - Most common, good balance of speed and compression
    Gzip,
    /// Zstandard compression (.zst) - Modern, fast compression with good ratios
    Zstd,
    /// Bzip2 compression (.bz2) - Good compression ratio, slower than gzip
    Bzip2,
    /// XZ compression (.xz) - Excellent compression ratio, slower than bzip2
    Xz,
}

impl CompressionFormat {
    /// Detect compression format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            match ext.to_lowercase().as_str() {
                "gz" => Some(Self::Gzip),
                "zst" | "zstd" => Some(Self::Zstd),
                "bz2" | "bz" => Some(Self::Bzip2),
                "xz" => Some(Self::Xz),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Parse the name used in config files ("gzip", "zstd", "bzip2", "xz").
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_str(name, true).ok()
    }
}

/// Dashboard page to show on start-up
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PageArg {
    /// Totals, dimension bars, state ranking
    Overview,
    /// Discount heatmap, category breakdown, margin by discount
    Financial,
    /// Computed insights
    Insights,
}

/// Metric selected on start-up
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum MetricArg {
    /// Number of transactions
    Transactions,
    /// Total sale
    Sale,
    /// Total profit
    Profit,
    /// Total quantity
    Quantity,
    /// Mean discount
    Discount,
}

/// Summary to print with `--print`
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PrintView {
    DeliveryType,
    Segment,
    Region,
    Category,
    Geography,
    Insights,
}

/// Command-line arguments for salesdash
#[derive(Clone, Parser, Debug)]
#[command(
    name = "salesdash",
    version,
    about = "Sales analytics dashboard in the terminal",
    long_about = "Loads a CSV of sales transactions and shows profit-margin \
                  aggregates by delivery type, segment, region, category and state."
)]
pub struct Args {
    /// Path to the transactions CSV (optionally .gz, .zst, .bz2 or .xz compressed)
    #[arg(required_unless_present_any = ["generate_config", "clear_cache"], value_name = "PATH")]
    pub path: Option<std::path::PathBuf>,

    /// Skip this many rows when reading a file
    #[arg(long = "skip-rows")]
    pub skip_rows: Option<usize>,

    /// Specify that the file has no header
    #[arg(long = "no-header")]
    pub no_header: Option<bool>,

    /// Specify the delimiter to use when reading a file
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Specify the compression format explicitly (gzip, zstd, bzip2, xz)
    /// If not specified, compression is auto-detected from file extension.
    #[arg(long = "compression", value_enum)]
    pub compression: Option<CompressionFormat>,

    /// Page to show on start-up
    #[arg(long = "page", value_enum)]
    pub page: Option<PageArg>,

    /// Metric to select on start-up
    #[arg(long = "metric", value_enum)]
    pub metric: Option<MetricArg>,

    /// Print a summary table to stdout and exit without starting the dashboard
    #[arg(long = "print", value_enum, value_name = "VIEW")]
    pub print: Option<PrintView>,

    /// Enable debug mode: write a log file and show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Clear all cache data and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Write the default configuration file and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Overwrite an existing configuration file (with --generate-config)
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render the command-line options as a markdown table.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let placeholder: String = arg
            .get_value_names()
            .map(|names| {
                names
                    .iter()
                    .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let option_str = if arg.is_positional() {
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            if !arg.get_action().takes_values() || placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
