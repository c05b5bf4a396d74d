//! `stylish` - concise build-progress reporter for bundler stats.
//!
//! See `README.md` for user documentation and `DESIGN.md` for architecture.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stylish::cli::{Cli, Command};

fn main() -> Result<()> {
    // Report output owns stdout; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("STYLISH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Command::Schema => {
            let schema = stylish::events::generate_schema()?;
            println!("{}", schema);
            0
        }
        Command::Report(args) => match stylish::engine::report(args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("error: {e:#}");
                stylish::exit_codes::exit::OPERATIONAL_FAILURE
            }
        },
    };
    std::process::exit(exit_code);
}
