//! Text styling of extracted build data.

use std::time::Duration;

use bytesize::ByteSize;
use colored::Colorize;

use crate::model::{Asset, BuildSummary};
use crate::parse::{Footer, Hidden, Problems, Severity};

/// Header printed once per process.
pub fn header(tool_name: &str, version: &str) -> String {
    let label = if version.is_empty() {
        tool_name.to_string()
    } else {
        format!("{tool_name} v{version}")
    };
    format!("\n{}\n", label.cyan())
}

/// Build identity block: hash and time, then the asset table and the hidden
/// items line when there is one.
pub fn hash(summary: &BuildSummary, files: &[&Asset], hidden: Hidden) -> String {
    let mut lines = Vec::new();
    let mut title = String::new();
    if let Some(name) = summary.name.as_deref().filter(|n| !n.is_empty()) {
        title.push_str(&format!("{}  ", name.bold()));
    }
    title.push_str(&format!(
        "{} {}  {} {}",
        "hash".dimmed(),
        summary.hash,
        "time".dimmed(),
        duration(summary.elapsed_ms)
    ));
    lines.push(title);

    if !files.is_empty() {
        let width = files
            .iter()
            .map(|a| ByteSize::b(a.size).to_string().len())
            .max()
            .unwrap_or(0);
        for asset in files {
            let size = ByteSize::b(asset.size).to_string();
            let mut row = format!("  {:>width$}  {}", size.dimmed(), asset.name);
            if !asset.chunk_names.is_empty() {
                row.push_str(&format!("  {}", asset.chunk_names.join(", ").dimmed()));
            }
            if asset.emitted {
                row.push_str(&format!("  {}", "[emitted]".green()));
            }
            lines.push(row);
        }
    }

    let hidden = self::hidden(hidden);
    if !hidden.is_empty() {
        lines.push(hidden);
    }
    lines.join("\n")
}

/// `+ 3 hidden assets, 12 hidden modules`, or an empty string.
pub fn hidden(hidden: Hidden) -> String {
    let mut parts = Vec::new();
    if hidden.assets > 0 {
        parts.push(format!("{} hidden {}", hidden.assets, plural(hidden.assets, "asset")));
    }
    if hidden.modules > 0 {
        parts.push(format!("{} hidden {}", hidden.modules, plural(hidden.modules, "module")));
    }
    if parts.is_empty() {
        return String::new();
    }
    format!("  {}", format!("+ {}", parts.join(", ")).dimmed())
}

/// Problems grouped under their file, or an empty string.
pub fn problems(problems: &Problems) -> String {
    let mut lines = Vec::new();
    for (file, entries) in &problems.files {
        lines.push(String::new());
        let file = if file.is_empty() { "<unknown>" } else { file.as_str() };
        lines.push(file.underline().to_string());
        for p in entries {
            let symbol = match p.severity {
                Severity::Error => "✖".red(),
                Severity::Warning => "⚠".yellow(),
            };
            let loc = p.loc.as_deref().unwrap_or("");
            let mut message = p.message.lines();
            let first = message.next().unwrap_or("");
            lines.push(format!("  {:>7}  {}  {}", loc.dimmed(), symbol, first));
            for rest in message {
                lines.push(format!("{:13}{}", "", rest.dimmed()));
            }
        }
    }
    lines.join("\n")
}

/// Footer lines for accumulated totals.
pub fn footer(footer: &Footer) -> String {
    let mut lines = vec![String::new()];
    if footer.errors > 0 {
        lines.push(
            format!("✖ {} {}", footer.errors, plural(footer.errors, "error"))
                .red()
                .to_string(),
        );
    }
    if footer.warnings > 0 {
        lines.push(
            format!("⚠ {} {}", footer.warnings, plural(footer.warnings, "warning"))
                .yellow()
                .to_string(),
        );
    }
    if footer.errors == 0 && footer.warnings == 0 {
        lines.push(format!("{} no problems", "✔".green()));
    }
    lines.push(format!(
        "{} {}",
        "◷ built in".dimmed(),
        duration(footer.elapsed_ms)
    ));
    lines.join("\n")
}

/// Human duration, `600ms` or `1s 500ms`.
pub fn duration(ms: u64) -> String {
    if ms == 0 {
        return "0ms".to_string();
    }
    humantime::format_duration(Duration::from_millis(ms)).to_string()
}

fn plural(n: u64, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_footer_counts_and_time() {
        plain();
        let text = footer(&Footer {
            errors: 3,
            warnings: 1,
            elapsed_ms: 600,
        });
        assert!(text.contains("✖ 3 errors"));
        assert!(text.contains("⚠ 1 warning"));
        assert!(!text.contains("warnings"));
        assert!(text.contains("built in 600ms"));
    }

    #[test]
    fn test_clean_footer() {
        plain();
        let text = footer(&Footer {
            errors: 0,
            warnings: 0,
            elapsed_ms: 1500,
        });
        assert!(text.contains("no problems"));
        assert!(text.contains("1s 500ms"));
    }

    #[test]
    fn test_hidden_line() {
        plain();
        assert_eq!(hidden(Hidden::default()), "");
        assert_eq!(
            hidden(Hidden { assets: 1, modules: 12 }),
            "  + 1 hidden asset, 12 hidden modules"
        );
    }

    #[test]
    fn test_hash_block_lists_assets() {
        plain();
        let summary = BuildSummary {
            hash: "abc123".into(),
            elapsed_ms: 42,
            name: Some("client".into()),
            ..Default::default()
        };
        let asset = Asset {
            name: "main.js".into(),
            size: 2048,
            chunk_names: vec!["main".into()],
            emitted: true,
        };
        let text = hash(&summary, &[&asset], Hidden { assets: 0, modules: 2 });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "client  hash abc123  time 42ms");
        assert!(lines[1].contains("main.js"));
        assert!(lines[1].contains("[emitted]"));
        assert_eq!(lines[2], "  + 2 hidden modules");
    }
}
