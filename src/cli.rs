use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Concise build-progress reporter for module bundler stats.
#[derive(Parser)]
#[command(name = "stylish", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print JSON Schema for the event stream.
    Schema,
    /// Replay a stream of compiler and build events and report on them.
    Report(ReportArgs),
}

#[derive(Args)]
pub struct ReportArgs {
    /// NDJSON event stream; reads stdin when omitted.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Treat every compiler as running in watch mode.
    #[arg(long)]
    pub watch: bool,

    /// Label shown before the version in the header.
    #[arg(long, default_value = "webpack")]
    pub tool_name: String,

    /// Path fragment whose assets are hidden; repeatable. Replaces the defaults.
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// When to emit ANSI colors.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}
