//! CLI argument definitions for the summer precipitation pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use precip_model::{DuplicatePolicy, NullPolicy};

#[derive(Parser)]
#[command(
    name = "summer-precip",
    version,
    about = "Growing-season precipitation change from a reference year",
    long_about = "Turn monthly per-region precipitation tables, one per climate scenario,\n\
                  into per-region seasonal totals with their change from a reference year."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Process every scenario table in a directory.
    Run(RunArgs),

    /// Print the effective configuration as TOML.
    Config(ConfigArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Directory holding one CSV table per scenario.
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Write a JSON run report to this path.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Run every stage without writing any table.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Also write the seasonal, transposed and baseline tables.
    #[arg(long = "keep-intermediate")]
    pub keep_intermediate: bool,

    /// Do not draw a progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

/// Configuration file and per-setting overrides.
#[derive(Args, Default)]
pub struct ConfigArgs {
    /// TOML configuration file.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// First month of the season window (1-12).
    #[arg(long = "season-start", value_name = "MONTH")]
    pub season_start: Option<u32>,

    /// Last month of the season window (1-12).
    #[arg(long = "season-end", value_name = "MONTH")]
    pub season_end: Option<u32>,

    /// Year whose totals serve as the baseline.
    #[arg(long = "reference-year", value_name = "YEAR")]
    pub reference_year: Option<i64>,

    /// Glob selecting scenario tables in the input directory.
    #[arg(long = "pattern", value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Output directory (default: the input directory).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// How missing monthly values enter the season total.
    #[arg(long = "null-policy", value_enum)]
    pub null_policy: Option<NullPolicyArg>,

    /// Which value wins when a region repeats in the reference year.
    #[arg(long = "duplicate-policy", value_enum)]
    pub duplicate_policy: Option<DuplicatePolicyArg>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum NullPolicyArg {
    /// Skip missing values; an all-missing season is null.
    Exclude,
    /// Count missing values as zero.
    TreatAsZero,
}

impl From<NullPolicyArg> for NullPolicy {
    fn from(value: NullPolicyArg) -> Self {
        match value {
            NullPolicyArg::Exclude => Self::Exclude,
            NullPolicyArg::TreatAsZero => Self::TreatAsZero,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DuplicatePolicyArg {
    LastWins,
    FirstWins,
    /// Abort the run.
    Reject,
}

impl From<DuplicatePolicyArg> for DuplicatePolicy {
    fn from(value: DuplicatePolicyArg) -> Self {
        match value {
            DuplicatePolicyArg::LastWins => Self::LastWins,
            DuplicatePolicyArg::FirstWins => Self::FirstWins,
            DuplicatePolicyArg::Reject => Self::Reject,
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
