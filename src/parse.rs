//! Stateless extraction of structured data from a [`BuildSummary`].
//!
//! Nothing here touches reporter state; the controller decides what to do
//! with the counts these functions return.

use std::collections::BTreeMap;
use std::path::Path;

use crate::model::{Asset, BuildSummary, RawProblem};

/// Severity of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single error or warning attributed to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub severity: Severity,
    /// `line:column` when known.
    pub loc: Option<String>,
    pub message: String,
}

/// Problems of one build grouped by file, with counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Problems {
    /// Keyed by module path; problems with no module land under `""`.
    pub files: BTreeMap<String, Vec<Problem>>,
    pub error_count: u64,
    pub warning_count: u64,
}

impl Problems {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Counts of output suppressed by filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hidden {
    pub assets: u64,
    pub modules: u64,
}

impl Hidden {
    pub fn is_empty(&self) -> bool {
        self.assets == 0 && self.modules == 0
    }
}

/// Accumulated counts since the last footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub error_count: u64,
    pub warning_count: u64,
    pub elapsed_ms: u64,
}

impl Totals {
    pub fn is_zero(&self) -> bool {
        *self == Totals::default()
    }
}

/// Data shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub errors: u64,
    pub warnings: u64,
    pub elapsed_ms: u64,
}

/// Group the errors and warnings of `summary` by file.
///
/// Module paths under `context` are shown relative to it.
pub fn problems(summary: &BuildSummary, context: Option<&Path>) -> Problems {
    let mut out = Problems::default();
    for raw in &summary.errors {
        push_problem(&mut out, raw, Severity::Error, context);
        out.error_count += 1;
    }
    for raw in &summary.warnings {
        push_problem(&mut out, raw, Severity::Warning, context);
        out.warning_count += 1;
    }
    out
}

fn push_problem(out: &mut Problems, raw: &RawProblem, severity: Severity, context: Option<&Path>) {
    let (file, loc, message) = match raw {
        RawProblem::Text(text) => split_text_problem(text),
        RawProblem::Detailed(detail) => (
            detail.module_name.clone().unwrap_or_default(),
            detail.loc.clone(),
            detail.message.trim().to_string(),
        ),
    };
    let file = relative_to(&file, context);
    out.files.entry(file).or_default().push(Problem {
        severity,
        loc,
        message,
    });
}

/// Old-style problems carry the module path on the first line when that line
/// looks like a path, and sometimes a `(line,col)` suffix on the message.
fn split_text_problem(text: &str) -> (String, Option<String>, String) {
    let text = text.trim();
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    let looks_like_path = first.starts_with("./")
        || first.starts_with('/')
        || (!first.contains(' ') && first.contains('.'));
    if !looks_like_path || rest.is_empty() {
        return (String::new(), None, text.to_string());
    }
    let rest = rest.trim();
    let (message_line, tail) = rest.split_once('\n').unwrap_or((rest, ""));
    let loc = extract_loc(message_line);
    let mut message = message_line.to_string();
    if !tail.is_empty() {
        message.push('\n');
        message.push_str(tail);
    }
    (first.to_string(), loc, message)
}

/// Pull `12:5` out of a message ending in `(12:5)` or `(12,5)`.
fn extract_loc(line: &str) -> Option<String> {
    let open = line.rfind('(')?;
    let inner = line[open + 1..].strip_suffix(')')?;
    let (l, c) = inner.split_once([':', ','])?;
    let (l, c) = (l.trim(), c.trim());
    if l.parse::<u32>().is_ok() && c.parse::<u32>().is_ok() {
        Some(format!("{l}:{c}"))
    } else {
        None
    }
}

fn relative_to(file: &str, context: Option<&Path>) -> String {
    let Some(context) = context else {
        return file.to_string();
    };
    match Path::new(file).strip_prefix(context) {
        Ok(rel) => format!("./{}", rel.display()),
        Err(_) => file.to_string(),
    }
}

/// Assets to list, excluding any whose name contains an excluded fragment.
pub fn files<'a>(summary: &'a BuildSummary, exclude: &[String]) -> Vec<&'a Asset> {
    summary
        .assets
        .iter()
        .filter(|asset| !is_excluded(&asset.name, exclude))
        .collect()
}

/// Everything filtered out, both by the bundler and by `exclude`.
pub fn hidden(summary: &BuildSummary, exclude: &[String]) -> Hidden {
    let excluded = summary
        .assets
        .iter()
        .filter(|asset| is_excluded(&asset.name, exclude))
        .count() as u64;
    Hidden {
        assets: summary.filtered_assets.saturating_add(excluded),
        modules: summary.filtered_modules,
    }
}

fn is_excluded(name: &str, exclude: &[String]) -> bool {
    name.split(['/', '\\'])
        .any(|segment| exclude.iter().any(|e| e == segment))
}

/// Footer for the accumulated totals, or `None` when there is nothing to show.
pub fn footer(totals: &Totals) -> Option<Footer> {
    if totals.is_zero() {
        return None;
    }
    Some(Footer {
        errors: totals.error_count,
        warnings: totals.warning_count,
        elapsed_ms: totals.elapsed_ms,
    })
}
