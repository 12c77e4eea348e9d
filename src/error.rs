use thiserror::Error;

/// Failures at the crate's I/O boundary. Parsing and highlighting never fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {input}: {source}")]
    Io {
        input: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid layout configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
