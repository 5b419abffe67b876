//! Error taxonomy for conversion runs.
//!
//! Per-file variants (`MalformedHeader`, `UnterminatedHeader`,
//! `ConversionFailed`, `Read`, `Write`) are recorded in a report and never
//! abort a batch. `Discovery`, `NotADirectory` and `NoInputs` are raised
//! before any file is converted.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The frontmatter block exists but is not valid YAML for a definition header.
    #[error("malformed frontmatter in '{identifier}': {source}")]
    MalformedHeader {
        identifier: String,
        source: serde_yaml::Error,
    },

    /// Opening `---` without a closing delimiter line.
    #[error("unterminated frontmatter in '{identifier}' (expected closing '---')")]
    UnterminatedHeader { identifier: String },

    #[error("conversion failed for '{identifier}': {reason}")]
    ConversionFailed { identifier: String, reason: String },

    #[error("cannot read source root {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("source root {} is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("no input files found under {}", .path.display())]
    NoInputs { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to render frontmatter: {0}")]
    Render(#[from] serde_yaml::Error),

    #[error("invalid TOML: {0}")]
    Tables(#[from] toml::de::Error),
}

impl ConvertError {
    /// Errors that stop a run before any conversion starts.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::Discovery { .. }
                | ConvertError::NotADirectory { .. }
                | ConvertError::NoInputs { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
