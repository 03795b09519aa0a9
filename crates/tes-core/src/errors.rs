use std::path::PathBuf;

/// Core error type for the exporter.
///
/// Adapter crates map their library errors into this type so the entry point can
/// report every fatal condition the same way. Per-file download failures are the
/// only errors the exporter swallows (after reporting them).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid path: {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("sign-in failed: {0}")]
    Auth(String),

    #[error("unexpected response to {request}: {got}")]
    UnexpectedResponse { request: &'static str, got: String },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
