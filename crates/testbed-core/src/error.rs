//! Configuration Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the shared configuration file.
///
/// Configuration failures are fatal: callers report them immediately and
/// never retry.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file missing or unreadable
    #[error("Error loading config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Config file parsed but carries no usable API key
    #[error("No API key found in configuration file")]
    MissingApiKey,
}
