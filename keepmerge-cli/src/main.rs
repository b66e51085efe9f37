//! `keepmerge` CLI - merges KeePassX XML database exports
//!
//! Takes any number of input databases followed by one output path, keeps the
//! most recently modified version of every credential and writes the merged
//! database to the output path.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use keepmerge_core::config::{ConfigManager, MergeSettings};
use keepmerge_core::{merge_files, MergeError, MergeReport, WriteOptions};
use tracing_subscriber::EnvFilter;

/// Merge KeePassX XML databases, keeping the most recent version of every entry
#[derive(Parser, Debug)]
#[command(name = "keepmerge")]
#[command(author, version, about = "Merge KeePassX XML database exports")]
pub struct Cli {
    /// Input databases followed by the output database path
    #[arg(
        value_name = "PATH",
        num_args = 1..,
        required_unless_present = "write_default_config"
    )]
    pub paths: Vec<PathBuf>,

    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print a summary of the merge
    #[arg(short, long, default_value = "none", value_enum)]
    pub report: ReportFormat,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write the default configuration file and exit
    #[arg(long)]
    pub write_default_config: bool,
}

impl Cli {
    /// Splits the positional paths into inputs and the output path
    #[must_use]
    pub fn inputs_and_output(&self) -> Option<(&[PathBuf], &Path)> {
        self.paths
            .split_last()
            .map(|(output, inputs)| (inputs, output.as_path()))
    }
}

/// Output format for the merge summary
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Print nothing
    None,
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_config_file(path.clone()),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}")))?,
    };

    if cli.write_default_config {
        return cmd_write_default_config(&config_manager);
    }

    let settings = config_manager
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?;

    init_logging(&settings.logging.level, cli.verbose);

    let (inputs, output) = cli
        .inputs_and_output()
        .ok_or_else(|| CliError::Usage("an output path is required".to_string()))?;

    cmd_merge(inputs, output, &settings, cli.report)
}

/// Initializes the tracing subscriber on stderr
fn init_logging(level: &str, verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = match verbosity {
            0 => level,
            1 => "info",
            _ => "debug",
        };
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge command handler
fn cmd_merge(
    inputs: &[PathBuf],
    output: &Path,
    settings: &MergeSettings,
    report_format: ReportFormat,
) -> Result<(), CliError> {
    if inputs.iter().any(|input| is_same_file(input, output)) {
        return Err(CliError::Usage(format!(
            "output path {} is also an input",
            output.display()
        )));
    }

    let options = WriteOptions::from(&settings.output);
    tracing::debug!(
        inputs = inputs.len(),
        output = %output.display(),
        "Merging databases"
    );
    let report = merge_files(inputs, output, &options)?;
    tracing::info!("{}", report.summary());

    print_report(&report, report_format)
}

/// Compares paths by their canonical form when both exist
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn print_report(report: &MergeReport, format: ReportFormat) -> Result<(), CliError> {
    match format {
        ReportFormat::None => {}
        ReportFormat::Table => {
            println!("Merge Summary:");
            println!("  Documents merged: {}", report.documents);
            println!("  Groups read: {}", report.groups_seen);
            println!("  Groups excluded: {}", report.excluded_groups);
            println!("  Entries read: {}", report.entries_loaded);
            println!("  Duplicates dropped: {}", report.duplicates_dropped);
            println!("  Groups written: {}", report.groups_written);
            println!("  Entries written: {}", report.entries_written);
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .map_err(|e| CliError::Report(format!("Failed to serialize report: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Writes the default settings unless a configuration file already exists
fn cmd_write_default_config(config_manager: &ConfigManager) -> Result<(), CliError> {
    let path = config_manager.config_path();
    if path.exists() {
        return Err(CliError::Config(format!(
            "{} already exists",
            path.display()
        )));
    }

    config_manager
        .save_settings(&MergeSettings::default())
        .map_err(|e| CliError::Config(format!("Failed to save settings: {e}")))?;

    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration, usage or report errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Input error - an input database is malformed
    pub const INPUT_ERROR: i32 = 2;
    /// IO error - an input could not be read or the output could not be written
    pub const IO_ERROR: i32 = 3;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command line
    #[error("Usage error: {0}")]
    Usage(String),

    /// Malformed input database
    #[error("{0}")]
    Input(String),

    /// File system error
    #[error("{0}")]
    Io(String),

    /// Report output error
    #[error("Report error: {0}")]
    Report(String),
}

impl From<MergeError> for CliError {
    fn from(error: MergeError) -> Self {
        if error.is_document_error() {
            Self::Input(error.to_string())
        } else if error.is_io_error() {
            Self::Io(error.to_string())
        } else {
            Self::Config(error.to_string())
        }
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, usage, report)
    /// - 2: Malformed input database (parse or timestamp format)
    /// - 3: IO error (unreadable input, unwritable output)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Input(_) => exit_codes::INPUT_ERROR,
            Self::Io(_) => exit_codes::IO_ERROR,
            Self::Config(_) | Self::Usage(_) | Self::Report(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
