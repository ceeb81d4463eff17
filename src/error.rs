use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that end an analyzer run.
///
/// Nothing here is retried: every variant is reported to the user and the
/// process exits nonzero.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The API key environment variable is unset or empty.
    #[error("{var} environment variable not set")]
    MissingCredential { var: String },

    /// The generation service call failed (transport, auth, quota, bad body).
    #[error("generation request failed: {0:#}")]
    UpstreamFailure(anyhow::Error),

    /// The reply has no `{ ... }` span to parse.
    #[error("no JSON object found in model output")]
    NoJsonFound,

    /// The `{ ... }` span in the reply is not valid JSON.
    #[error("malformed JSON in model output: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// Valid JSON that does not match the structure we asked for.
    #[error("model output has an unexpected shape: {0}")]
    UnexpectedShape(#[source] serde_json::Error),

    #[error("prompt template must contain {placeholder} exactly once (found {count})")]
    InvalidTemplate { placeholder: String, count: usize },

    #[error("failed to access {}: {source}", path.display())]
    FilesystemFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} not found", .0.display())]
    ReportMissing(PathBuf),

    #[error("report is invalid:\n{}", .0.join("\n"))]
    ReportInvalid(Vec<String>),
}

impl AnalyzerError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AnalyzerError::FilesystemFailure { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
