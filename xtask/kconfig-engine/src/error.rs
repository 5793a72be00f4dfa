use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KconfigError {
    #[error("IO error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dependency loop was found while building the dependency graph.
    /// `items` holds the names along the loop, in detection order.
    #[error("Dependency loop detected{chain}")]
    DependencyLoop { items: Vec<String>, chain: String },

    #[error("{item} has a malformed default {default} -- expected a single symbol")]
    MalformedDefault { item: String, default: String },

    #[error("Construction error: {0}")]
    Construction(String),

    #[error("{0} is not a valid bool value (use 0 for n or 2 for y)")]
    InvalidBoolValue(u8),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, KconfigError>;
