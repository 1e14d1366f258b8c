use thiserror::Error;

#[derive(Error, Debug)]
pub enum TermWatchError {
    /// One named source failed to fetch. Logged and skipped; the polling
    /// cycle continues with the next source.
    #[error("Source unavailable: {source_name}: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// A settings file is absent. Callers degrade to an empty value
    /// rather than aborting startup.
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    /// The report could not be persisted. Fatal: the process exits
    /// non-zero and the operator must fix the path and rerun.
    #[error("Output write failed: {path}: {reason}")]
    OutputWrite { path: String, reason: String },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
