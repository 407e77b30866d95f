use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by discovery, manifest I/O, the catalog checker and config loading.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("wrappers directory not found: {}", path.display())]
    WrappersDirMissing { path: PathBuf },

    #[error("catalog directory not found: {}", path.display())]
    CatalogDirMissing { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    ManifestSyntax(#[source] serde_json::Error),

    #[error("top-level value is not a JSON object")]
    ManifestNotObject,

    #[error("invalid catalog entity {}: {source}", path.display())]
    CatalogSyntax {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ConfigSyntax {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {message}")]
    ConfigInvalid { message: String },
}

pub type Result<T> = std::result::Result<T, SweepError>;
