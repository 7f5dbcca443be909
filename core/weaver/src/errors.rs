//! Error types for the binding generator.

use std::path::PathBuf;

use thiserror::Error;
use weaver_ast::errors::AstError;

/// Errors that abort generation for one IO section.
///
/// Redeclarations and unsupported template contexts are not errors; they are
/// reported as [`Diagnostic`](crate::diagnostics::Diagnostic)s on the tree.
#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum WeaverError {
    /// The configuration is structurally valid TOML but not usable.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("failed to read configuration {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {source}")]
    ConfigSyntax {
        #[source]
        source: toml::de::Error,
    },

    /// An input directory could not be walked.
    #[error("failed to expand input directory {}: {source}", path.display())]
    InputWalk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to parse {}", file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: AstError,
    },

    /// Re-parsing with synthesized explicit instantiations failed.
    #[error("failed to re-parse {} with synthesized template instantiations", file.display())]
    Reparse {
        file: PathBuf,
        #[source]
        source: AstError,
    },

    #[error("dependency cycle between entities: {}", entities.join(" -> "))]
    DependencyCycle { entities: Vec<String> },
}

impl WeaverError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        WeaverError::Config {
            reason: reason.into(),
        }
    }
}
