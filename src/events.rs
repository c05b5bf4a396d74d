use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::BuildSummary;

/// One line of the host event stream.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Declare a compiler and attach the reporter to it.
    Compiler {
        name: String,
        /// Compiler exposes the modern hook registry.
        #[serde(default = "default_true")]
        hooks: bool,
        /// Compiler exposes the legacy plugin registry.
        #[serde(default)]
        plugins: bool,
        #[serde(default)]
        watch: bool,
        #[serde(default)]
        context: Option<PathBuf>,
    },
    /// A build of `compiler` finished.
    Done {
        compiler: String,
        #[serde(default, deserialize_with = "crate::model::null_as_default")]
        #[schemars(with = "Option<BuildSummary>")]
        stats: BuildSummary,
    },
}

fn default_true() -> bool {
    true
}

/// Generate JSON Schema for the event stream.
pub fn generate_schema() -> Result<String> {
    let schema = schemars::schema_for!(Event);
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// Parse one non-empty line of the stream.
pub fn from_line(line: &str) -> Result<Event> {
    let event = serde_json::from_str(line)?;
    Ok(event)
}
