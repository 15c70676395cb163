//! Error types for profile operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, saving, or validating profiles.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A profile file could not be read.
    #[error("cannot read profile '{path}': {source}")]
    ReadFile {
        /// The profile path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A profile file could not be written.
    #[error("cannot write profile '{path}': {source}")]
    WriteFile {
        /// The profile path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The directory holding a profile could not be created.
    #[error("cannot create profile directory '{path}': {source}")]
    CreateDir {
        /// The directory path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Profile TOML is malformed or holds mistyped values.
    #[error("invalid profile TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A profile could not be rendered as TOML.
    #[error("cannot serialize profile: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Neither a factory profile nor a readable file.
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// The profile's options contradict each other.
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}

impl ConfigError {
    pub(crate) fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}
