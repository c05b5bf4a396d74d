use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::rc::Rc;
use tracing::info;

use crate::cli::{ColorMode, ReportArgs};
use crate::error::ReportError;
use crate::events::{self, Event};
use crate::exit_codes::exit;
use crate::host::{self, Compiler, CompilerOptions, Hooks, PluginRegistry};
use crate::model::{self, ReporterOptions};
use crate::reporter::ReportController;

pub fn report(args: ReportArgs) -> Result<i32> {
    match args.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let options = ReporterOptions {
        tool_name: args.tool_name,
        exclude: if args.exclude.is_empty() {
            model::default_exclude()
        } else {
            args.exclude
        },
    };
    let controller = Rc::new(RefCell::new(ReportController::new(
        std::io::stdout(),
        options,
    )));

    match &args.input {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            replay(BufReader::new(file), &controller, args.watch)
        }
        None => replay(std::io::stdin().lock(), &controller, args.watch),
    }
}

/// Feed an NDJSON event stream through host compilers attached to
/// `controller`. Returns the exit code for the run.
pub fn replay<R: BufRead, W: Write + 'static>(
    reader: R,
    controller: &Rc<RefCell<ReportController<W>>>,
    force_watch: bool,
) -> Result<i32> {
    let mut compilers: HashMap<String, Compiler> = HashMap::new();

    for (idx, line) in reader.lines().enumerate() {
        let lineno = idx + 1;
        let line = line.context("failed to read event stream")?;
        if line.trim().is_empty() {
            continue;
        }
        let event = events::from_line(&line)
            .with_context(|| format!("invalid event on line {lineno}"))?;

        match event {
            Event::Compiler {
                name,
                hooks,
                plugins,
                watch,
                context,
            } => {
                if compilers.contains_key(&name) {
                    return Err(ReportError::DuplicateCompiler(name))
                        .with_context(|| format!("compiler event on line {lineno}"));
                }
                let mut compiler = Compiler {
                    name: name.clone(),
                    options: CompilerOptions {
                        watch: watch || force_watch,
                        context,
                        ..Default::default()
                    },
                    hooks: hooks.then(Hooks::default),
                    plugins: plugins.then(PluginRegistry::default),
                };
                let delivery = host::attach(controller, &mut compiler)
                    .with_context(|| format!("cannot attach to compiler on line {lineno}"))?;
                info!(compiler = %name, ?delivery, "compiler declared");
                compilers.insert(name, compiler);
            }
            Event::Done { compiler, stats } => {
                let target = compilers
                    .get_mut(&compiler)
                    .ok_or_else(|| ReportError::UnknownCompiler(compiler.clone()))
                    .with_context(|| format!("build event on line {lineno}"))?;
                target
                    .emit_done(&stats)
                    .with_context(|| format!("build event on line {lineno}"))?;
            }
        }
    }

    // Skipped duplicates never count, whatever they carried.
    let builds_with_errors = controller.borrow().state().builds_with_errors;
    info!(
        compilers = compilers.len(),
        builds_with_errors, "event stream finished"
    );
    if builds_with_errors > 0 {
        Ok(exit::BUILD_ERRORS)
    } else {
        Ok(exit::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(stream: &str) -> (Result<i32>, String) {
        colored::control::set_override(false);
        let controller = Rc::new(RefCell::new(ReportController::new(
            Vec::new(),
            ReporterOptions::default(),
        )));
        let result = replay(Cursor::new(stream.to_string()), &controller, false);
        let out = String::from_utf8(controller.borrow().sink().clone()).unwrap();
        (result, out)
    }

    #[test]
    fn test_replay_two_compilers() {
        let stream = r#"
{"type":"compiler","name":"client"}
{"type":"compiler","name":"server","hooks":false,"plugins":true}
{"type":"done","compiler":"client","stats":{"hash":"c1","time":100,"version":"5.0.0"}}
{"type":"done","compiler":"server","stats":{"hash":"s1","time":200,"warnings":["careful"]}}
"#;
        let (result, out) = run(stream);
        assert_eq!(result.unwrap(), exit::SUCCESS);
        assert_eq!(out.matches("webpack v5.0.0").count(), 1);
        assert!(out.contains("hash c1"));
        assert!(out.contains("hash s1"));
        assert!(out.contains("⚠ 1 warning"));
        assert!(out.contains("built in 300ms"));
    }

    #[test]
    fn test_replay_reports_build_errors() {
        let stream = concat!(
            r#"{"type":"compiler","name":"a"}"#,
            "\n",
            r#"{"type":"done","compiler":"a","stats":{"hash":"h","errors":["broken"]}}"#,
        );
        let (result, _) = run(stream);
        assert_eq!(result.unwrap(), exit::BUILD_ERRORS);
    }

    #[test]
    fn test_unknown_compiler_is_fatal() {
        let (result, _) = run(r#"{"type":"done","compiler":"ghost","stats":{"hash":"h"}}"#);
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("unknown compiler 'ghost'"));
    }

    #[test]
    fn test_compiler_without_event_source_is_fatal() {
        let (result, _) = run(r#"{"type":"compiler","name":"a","hooks":false}"#);
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<ReportError>().is_some());
    }

    #[test]
    fn test_malformed_line_names_line_number() {
        let (result, _) = run("\n{not json}\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_errors_on_skipped_duplicate_do_not_fail_run() {
        let stream = r#"
{"type":"compiler","name":"a"}
{"type":"done","compiler":"a","stats":{"hash":"x","time":5}}
{"type":"done","compiler":"a","stats":{"hash":"x","time":5,"errors":["boom"]}}
"#;
        let (result, out) = run(stream);
        assert_eq!(result.unwrap(), exit::SUCCESS);
        assert!(out.contains("no problems"));
        assert!(!out.contains("boom"));
    }

    #[test]
    fn test_redeclared_compiler_is_rejected() {
        let stream = r#"{"type":"compiler","name":"a"}
{"type":"compiler","name":"a","plugins":true}
"#;
        let (result, _) = run(stream);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::DuplicateCompiler(name)) if name == "a"
        ));
    }

    #[test]
    fn test_null_stats_fields_still_render() {
        let stream = r#"
{"type":"compiler","name":"a"}
{"type":"done","compiler":"a","stats":{"hash":"x","time":5,"errors":null,"version":null}}
{"type":"compiler","name":"b"}
{"type":"done","compiler":"b","stats":null}
"#;
        let (result, out) = run(stream);
        assert_eq!(result.unwrap(), exit::SUCCESS);
        assert!(out.contains("hash x"));
    }

    #[test]
    fn test_huge_elapsed_times_do_not_overflow() {
        let stream = r#"
{"type":"compiler","name":"a"}
{"type":"compiler","name":"b"}
{"type":"done","compiler":"a","stats":{"hash":"h1","time":18446744073709551615}}
{"type":"done","compiler":"b","stats":{"hash":"h2","time":1}}
"#;
        let (result, out) = run(stream);
        assert_eq!(result.unwrap(), exit::SUCCESS);
        assert!(out.contains("hash h2"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_names_line_number() {
        let controller = Rc::new(RefCell::new(ReportController::new(
            BrokenPipe,
            ReporterOptions::default(),
        )));
        let stream = r#"{"type":"compiler","name":"a"}
{"type":"done","compiler":"a","stats":{"hash":"h","time":1}}
"#;
        let err = replay(Cursor::new(stream), &controller, false).unwrap_err();
        assert_eq!(err.to_string(), "build event on line 2");
        assert!(matches!(err.downcast_ref::<ReportError>(), Some(ReportError::Io(_))));
    }
}
