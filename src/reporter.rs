//! Aggregation state and render decisions for build-completion events.
//!
//! One [`ReportController`] is shared by every compiler attached to it. It
//! counts registrations against rendered builds, so output for a cycle of
//! several compilers ends with a single footer carrying the combined counts.

use std::io::Write;

use indexmap::IndexSet;
use tracing::debug;

use crate::error::Result;
use crate::model::{BuildSummary, RenderContext, ReporterOptions};
use crate::parse::{self, Footer, Totals};
use crate::style;

/// Counters and history owned by one controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationState {
    /// Registrations minus rendered builds. Goes negative in watch mode,
    /// where every rebuild is a completion without a matching registration.
    pub active_builds: i64,
    /// Hashes already rendered, in render order. Never shrinks.
    pub seen_hashes: IndexSet<String>,
    pub instance_count: u64,
    /// Reset whenever a footer is printed.
    pub totals: Totals,
    pub cumulative_elapsed_ms: u64,
    /// Rendered builds that reported at least one error.
    pub builds_with_errors: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderFlags {
    pub header_shown: bool,
    pub footer_shown_last: bool,
}

/// What a call to [`ReportController::on_build_complete`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Hash already rendered; nothing happened.
    Skipped,
    /// Output was written, with a footer when one was due.
    Rendered { footer: Option<Footer> },
}

/// Decides what to print for each finished build and writes it to `W`.
pub struct ReportController<W: Write> {
    sink: W,
    options: ReporterOptions,
    state: AggregationState,
    flags: RenderFlags,
}

impl<W: Write> ReportController<W> {
    pub fn new(sink: W, options: ReporterOptions) -> Self {
        Self {
            sink,
            options,
            state: AggregationState::default(),
            flags: RenderFlags::default(),
        }
    }

    /// Count one more compiler whose builds end up here.
    pub fn register(&mut self, instance_id: &str) {
        self.state.instance_count += 1;
        self.state.active_builds += 1;
        debug!(
            instance = instance_id,
            instances = self.state.instance_count,
            active = self.state.active_builds,
            "registered compiler"
        );
    }

    /// Handle one build-completion event.
    pub fn on_build_complete(
        &mut self,
        summary: &BuildSummary,
        ctx: &RenderContext,
    ) -> Result<Outcome> {
        // The host fires `done` more than once for the same compilation in
        // watch mode. A hash is rendered at most once.
        if self.state.seen_hashes.contains(&summary.hash) {
            debug!(hash = %summary.hash, "skipping already rendered build");
            return Ok(Outcome::Skipped);
        }

        self.state.active_builds -= 1;
        self.state.seen_hashes.insert(summary.hash.clone());
        let totals = &mut self.state.totals;
        totals.elapsed_ms = totals.elapsed_ms.saturating_add(summary.elapsed_ms);
        self.state.cumulative_elapsed_ms = self
            .state
            .cumulative_elapsed_ms
            .saturating_add(summary.elapsed_ms);

        // Counts go in before the footer decision below.
        let problems = parse::problems(summary, ctx.context.as_deref());
        let totals = &mut self.state.totals;
        totals.error_count = totals.error_count.saturating_add(problems.error_count);
        totals.warning_count = totals.warning_count.saturating_add(problems.warning_count);
        if problems.error_count > 0 {
            self.state.builds_with_errors += 1;
        }

        let files = parse::files(summary, &self.options.exclude);
        let hidden = parse::hidden(summary, &self.options.exclude);

        let mut out = Vec::new();
        if !self.flags.header_shown {
            self.flags.header_shown = true;
            out.push(style::header(&self.options.tool_name, &summary.version));
        }
        out.push(style::hash(summary, &files, hidden));
        if !problems.is_empty() {
            out.push(style::problems(&problems));
        }

        let mut footer = None;
        if self.state.active_builds <= 0 {
            footer = parse::footer(&self.state.totals);
            if let Some(f) = &footer {
                out.push(style::footer(f));
                self.flags.footer_shown_last = true;
                self.state.totals = Totals::default();
                debug!(
                    errors = f.errors,
                    warnings = f.warnings,
                    elapsed_ms = f.elapsed_ms,
                    "footer emitted"
                );
            }
        } else {
            self.flags.footer_shown_last = false;
        }

        let mut text = out.join("\n");
        text.push('\n');
        self.sink.write_all(text.as_bytes())?;
        if self.flags.footer_shown_last && ctx.watch {
            self.sink.write_all(b"\n")?;
        }
        self.sink.flush()?;

        Ok(Outcome::Rendered { footer })
    }

    pub fn state(&self) -> &AggregationState {
        &self.state
    }

    pub fn flags(&self) -> RenderFlags {
        self.flags
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn into_sink(self) -> W {
        self.sink
    }
}
