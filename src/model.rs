use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Result of one finished build, as reported by the bundler.
///
/// Every field is optional on the wire: a missing or `null` number is 0, a
/// missing or `null` list is empty and a missing or `null` string is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildSummary {
    /// Content identity of the build output.
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub hash: String,
    /// Build duration in milliseconds.
    #[serde(rename = "time", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<u64>")]
    pub elapsed_ms: u64,
    /// Bundler version; stable across builds in one process.
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub version: String,
    /// Compiler name, when the bundler runs several named configurations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Errors raised during the build.
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<RawProblem>>")]
    pub errors: Vec<RawProblem>,
    /// Warnings raised during the build.
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<RawProblem>>")]
    pub warnings: Vec<RawProblem>,
    /// Emitted assets.
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<Asset>>")]
    pub assets: Vec<Asset>,
    /// Assets the bundler itself filtered out of the stats.
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<u64>")]
    pub filtered_assets: u64,
    /// Modules the bundler itself filtered out of the stats.
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<u64>")]
    pub filtered_modules: u64,
}

/// An error or warning as it appears in stats.
///
/// Older bundlers emit plain strings whose first line is the module path;
/// newer ones emit objects.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum RawProblem {
    /// `"./src/a.js\nModule not found: ..."`
    Text(String),
    /// `{"message": "...", "moduleName": "./src/a.js", "loc": "3:7"}`
    Detailed(ProblemDetail),
}

/// Structured form of a problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProblemDetail {
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
}

/// One emitted asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Asset {
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub name: String,
    /// Size in bytes.
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<u64>")]
    pub size: u64,
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<String>>")]
    pub chunk_names: Vec<String>,
    /// Whether the asset was written during this build.
    #[serde(deserialize_with = "null_as_default")]
    #[schemars(with = "Option<bool>")]
    pub emitted: bool,
}

/// Options for one reporter instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterOptions {
    /// Label printed in front of the version in the header.
    pub tool_name: String,
    /// Path fragments whose assets are hidden from the file listing.
    pub exclude: Vec<String>,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            tool_name: "webpack".to_string(),
            exclude: default_exclude(),
        }
    }
}

/// Directories hidden from output unless overridden.
pub fn default_exclude() -> Vec<String> {
    ["node_modules", "bower_components", "components"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Per-compiler settings captured when a compiler is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    /// Compiler runs in continuous rebuild mode.
    pub watch: bool,
    /// Project root; stripped from module paths in problem output.
    pub context: Option<std::path::PathBuf>,
}

/// Absent keys are covered by `#[serde(default)]`; this covers explicit `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Parse a BuildSummary from a JSON string.
pub fn from_json(json: &str) -> Result<BuildSummary> {
    let summary = serde_json::from_str(json)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let summary = from_json(r#"{"hash":"abc"}"#).unwrap();
        assert_eq!(summary.hash, "abc");
        assert_eq!(summary.elapsed_ms, 0);
        assert!(summary.errors.is_empty());
        assert!(summary.assets.is_empty());
    }

    #[test]
    fn test_mixed_problem_shapes() {
        let summary = from_json(
            r#"{
                "hash": "h",
                "time": 12,
                "errors": ["./a.js\nboom", {"message": "bad", "moduleName": "./b.js", "loc": "1:2"}]
            }"#,
        )
        .unwrap();
        assert_eq!(summary.elapsed_ms, 12);
        assert!(matches!(summary.errors[0], RawProblem::Text(_)));
        match &summary.errors[1] {
            RawProblem::Detailed(d) => {
                assert_eq!(d.module_name.as_deref(), Some("./b.js"));
                assert_eq!(d.loc.as_deref(), Some("1:2"));
            }
            other => panic!("unexpected problem shape: {other:?}"),
        }
    }

    #[test]
    fn test_null_fields_default_to_empty() {
        let summary = from_json(
            r#"{
                "hash": "x",
                "time": null,
                "version": null,
                "errors": null,
                "warnings": null,
                "assets": [{"name": "main.js", "size": null, "chunkNames": null, "emitted": null}],
                "filteredAssets": null,
                "filteredModules": null
            }"#,
        )
        .unwrap();
        assert_eq!(summary.hash, "x");
        assert_eq!(summary.elapsed_ms, 0);
        assert_eq!(summary.version, "");
        assert!(summary.errors.is_empty());
        assert!(summary.warnings.is_empty());
        assert_eq!(summary.assets[0].size, 0);
        assert!(summary.assets[0].chunk_names.is_empty());
        assert_eq!(summary.filtered_assets, 0);

        let detail = from_json(r#"{"errors": [{"message": null, "moduleName": "./a.js"}]}"#).unwrap();
        assert!(matches!(&detail.errors[0], RawProblem::Detailed(d) if d.message.is_empty()));
    }
}
