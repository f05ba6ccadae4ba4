use std::path::PathBuf;

use thiserror::Error;

/// Conditions that stop a pipeline phase outright.
///
/// Producer failures, timeouts and dead hosts are not in here: those are
/// recovered where they happen and only show up in run reports.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no subdomains found for {domain}")]
    NoSubdomains { domain: String },

    #[error("none of the {checked} hostnames responded")]
    NoLiveHosts { checked: usize },

    #[error("unknown tool '{name}' (known: {known})")]
    UnknownTool { name: String, known: String },

    #[error("invalid domain '{0}'")]
    InvalidDomain(String),

    #[error("invalid command override '{0}', expected NAME=COMMAND")]
    InvalidOverride(String),

    #[error("invalid tool selection '{0}'")]
    InvalidSelection(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
