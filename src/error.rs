use std::path::PathBuf;
use thiserror::Error;

/// Fatal problems detected before any case is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingCredential(&'static str),
}

#[derive(Debug, Error)]
pub enum CaseSourceError {
    #[error("failed to read case file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed case record on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate case id '{id}' on line {line}")]
    DuplicateId { id: String, line: usize },
}

/// Failure of a single Solve or Judge call. Always recovered per case.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("received empty response from model '{model}'")]
    EmptyResponse { model: String },

    #[error("failed to read artifact {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// The judge answered, but not with a usable verdict.
#[derive(Debug, Error)]
pub enum VerdictError {
    #[error("verdict payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("verdict payload is not a JSON object")]
    NotAnObject,

    #[error("unknown style label: {0:?}")]
    UnknownStyleLabel(Option<String>),
}
