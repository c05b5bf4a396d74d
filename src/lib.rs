//! Concise console reporting for module bundler build stats.
//!
//! [`reporter::ReportController`] holds the aggregation state and decides
//! what each finished build prints; [`host::attach`] wires it to a compiler.

pub mod cli;
pub mod engine;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod host;
pub mod model;
pub mod parse;
pub mod reporter;
pub mod style;
