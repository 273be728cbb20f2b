//! CLI argument definitions for the QC runner.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use qc_model::Flag;

#[derive(Parser)]
#[command(
    name = "qc",
    version,
    about = "QC routine engine - flag suspect values in tabular sensor data",
    long_about = "Run an ordered list of quality-control routines over a CSV dataset.\n\n\
                  Every record ends with the worst flag any routine gave it\n\
                  (GOOD < QUESTIONABLE < BAD < FATAL) and the messages explaining why."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow record values to appear in trace-level logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the configured routines over a dataset.
    Run(RunArgs),

    /// List the routines that can be named in a routines file.
    Routines,
}

#[derive(Parser)]
pub struct RunArgs {
    /// CSV data file; its header must name every configured column.
    #[arg(long = "data", value_name = "CSV")]
    pub data: PathBuf,

    /// JSON column configuration: `[{"name": "SST", "type": "numeric"}]`.
    #[arg(long = "columns", value_name = "JSON")]
    pub columns: PathBuf,

    /// JSON routine list in run order: `[{"routine": "...", "parameters": [...]}]`.
    #[arg(long = "routines", value_name = "JSON")]
    pub routines: PathBuf,

    /// Write the full run report as JSON.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Exit with code 3 if any record reaches this flag or worse.
    #[arg(long = "fail-on", value_enum)]
    pub fail_on: Option<FlagArg>,

    /// Maximum number of messages printed in the message table.
    #[arg(long = "max-messages", default_value_t = 50)]
    pub max_messages: usize,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

/// Flags that can trigger `--fail-on`. GOOD is excluded since every record has it.
#[derive(Clone, Copy, ValueEnum)]
pub enum FlagArg {
    Questionable,
    Bad,
    Fatal,
}

impl From<FlagArg> for Flag {
    fn from(value: FlagArg) -> Self {
        match value {
            FlagArg::Questionable => Flag::Questionable,
            FlagArg::Bad => Flag::Bad,
            FlagArg::Fatal => Flag::Fatal,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
