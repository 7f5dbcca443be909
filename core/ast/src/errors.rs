//! Error types for the AST crate.
//!
//! This module defines structured errors for translation unit parsing and
//! snapshot construction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while a provider produces a translation unit.
#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum AstError {
    /// The provider could not be initialized (library missing, index creation failed).
    #[error("AST provider unavailable: {reason}")]
    ProviderUnavailable { reason: String },

    /// Failed to read a source file.
    #[error("failed to read {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The provider returned no translation unit at all.
    #[error("failed to parse {}", path.display())]
    ParseError { path: PathBuf },

    /// The provider produced a translation unit with error diagnostics.
    #[error("{} has errors:\n{}", path.display(), diagnostics.join("\n"))]
    Diagnostics {
        path: PathBuf,
        diagnostics: Vec<String>,
    },

    /// Source text or flags could not be handed to the provider.
    #[error("invalid parse request: {reason}")]
    InvalidRequest { reason: String },
}
