//! The slice of a bundler compiler the reporter attaches to, and the adapter
//! that does the attaching.
//!
//! A compiler delivers `done` events through one of two conventions: a
//! modern hook registry (`compiler.hooks.done.tap(..)`) or the legacy plugin
//! registry (`compiler.plugin("done", ..)`). [`attach`] prefers hooks.

use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::model::{BuildSummary, RenderContext};
use crate::reporter::ReportController;

/// Name under which the reporter subscribes.
pub const PLUGIN_NAME: &str = "stylish";

/// Callback run once per `done` event.
pub type DoneCallback = Box<dyn FnMut(&BuildSummary) -> Result<()>>;

/// Built-in stats printing mode of the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatsPreset {
    #[default]
    Normal,
    Minimal,
    ErrorsOnly,
    None,
}

#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    pub stats: StatsPreset,
    pub watch: bool,
    pub context: Option<PathBuf>,
}

/// Modern tap-based hook registry.
#[derive(Default)]
pub struct Hooks {
    pub done: DoneHook,
}

#[derive(Default)]
pub struct DoneHook {
    taps: Vec<(String, DoneCallback)>,
}

impl DoneHook {
    pub fn tap(&mut self, name: &str, callback: DoneCallback) {
        self.taps.push((name.to_string(), callback));
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

/// Legacy string-keyed plugin registry.
#[derive(Default)]
pub struct PluginRegistry {
    handlers: Vec<(String, DoneCallback)>,
}

impl PluginRegistry {
    /// Only `done` is dispatched; other event names are accepted and never fire.
    pub fn plugin(&mut self, event: &str, callback: DoneCallback) {
        self.handlers.push((event.to_string(), callback));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// A host compiler.
pub struct Compiler {
    pub name: String,
    pub options: CompilerOptions,
    pub hooks: Option<Hooks>,
    pub plugins: Option<PluginRegistry>,
}

impl Compiler {
    /// Compiler with the modern hook registry.
    pub fn new(name: impl Into<String>, options: CompilerOptions) -> Self {
        Self {
            name: name.into(),
            options,
            hooks: Some(Hooks::default()),
            plugins: None,
        }
    }

    /// Compiler exposing only the legacy plugin registry.
    pub fn legacy(name: impl Into<String>, options: CompilerOptions) -> Self {
        Self {
            name: name.into(),
            options,
            hooks: None,
            plugins: Some(PluginRegistry::default()),
        }
    }

    /// Fire `done` to every subscriber in subscription order.
    pub fn emit_done(&mut self, summary: &BuildSummary) -> Result<()> {
        if let Some(hooks) = &mut self.hooks {
            for (_, callback) in &mut hooks.done.taps {
                callback(summary)?;
            }
        }
        if let Some(plugins) = &mut self.plugins {
            for (event, callback) in &mut plugins.handlers {
                if event == "done" {
                    callback(summary)?;
                }
            }
        }
        Ok(())
    }
}

/// Which convention the reporter was subscribed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Hooks,
    Plugin,
}

/// Subscribe `controller` to `compiler`'s completion events.
///
/// Registers the compiler with the controller and silences the host's own
/// stats output. Fails when the compiler offers no way to subscribe.
pub fn attach<W: Write + 'static>(
    controller: &Rc<RefCell<ReportController<W>>>,
    compiler: &mut Compiler,
) -> Result<Delivery> {
    let ctx = RenderContext {
        watch: compiler.options.watch,
        context: compiler.options.context.clone(),
    };
    let shared = Rc::clone(controller);
    let callback: DoneCallback = Box::new(move |summary: &BuildSummary| {
        shared.borrow_mut().on_build_complete(summary, &ctx)?;
        Ok(())
    });

    let delivery = match (&mut compiler.hooks, &mut compiler.plugins) {
        (Some(hooks), _) => {
            hooks.done.tap(PLUGIN_NAME, callback);
            Delivery::Hooks
        }
        (None, Some(plugins)) => {
            plugins.plugin("done", callback);
            Delivery::Plugin
        }
        (None, None) => {
            return Err(ReportError::NoEventSource {
                compiler: compiler.name.clone(),
            });
        }
    };

    controller.borrow_mut().register(&compiler.name);
    compiler.options.stats = StatsPreset::None;
    debug!(compiler = %compiler.name, ?delivery, "attached reporter");
    Ok(delivery)
}
