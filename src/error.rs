use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No configuration file was found in the start directory or any of its
    /// ancestors.
    #[error("{file_name} not found - please check if you are in the right folder")]
    NotFound {
        file_name: String,
        start: PathBuf,
    },

    #[error("can't open {} for reading: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not well-formed JSON, or its top level is
    /// not an object. The underlying error carries line and column.
    #[error(
        "the configuration in {} contains invalid JSON: {source}. Please verify the syntax",
        path.display()
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document cannot be brought to the current schema automatically.
    ///
    /// This covers an unknown `format` tag as well as structural damage such
    /// as a profile that is not a mapping. These are never auto-corrected;
    /// the file has to be repaired by hand.
    #[error("invalid configuration, you have to fix it manually: {0}")]
    Schema(String),

    #[error("{0}")]
    InvalidProfile(String),

    #[error("can't write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("can't read settings from {}: {source}", path.display())]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML Deserialization: {0}")]
    TomlDeserialization(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        Error::Schema(reason.into())
    }
}
