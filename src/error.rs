use thiserror::Error;

/// Errors surfaced by the reporter and its host adapter.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The compiler exposes neither a hook registry nor a plugin registry.
    #[error("compiler '{compiler}' exposes no done-event source (neither hooks nor plugin)")]
    NoEventSource { compiler: String },

    /// A build event named a compiler that was never declared.
    #[error("unknown compiler '{0}'")]
    UnknownCompiler(String),

    /// A compiler name was declared twice in one stream.
    #[error("compiler '{0}' is already declared")]
    DuplicateCompiler(String),

    /// Writing to the output sink failed.
    #[error("failed to write report output")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
