//! The seam between the binding generator and whatever parses C++.

use std::path::PathBuf;

use crate::{errors::AstError, translation_unit::TranslationUnit};

/// An unsaved main file plus the compiler flags to parse it with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseRequest {
    pub file_name: PathBuf,
    pub source: String,
    pub flags: Vec<String>,
}

impl ParseRequest {
    #[must_use]
    pub fn new(file_name: impl Into<PathBuf>, source: &str, flags: &[String]) -> Self {
        Self {
            file_name: file_name.into(),
            source: source.to_string(),
            flags: flags.to_vec(),
        }
    }
}

/// Produces translation unit snapshots.
///
/// Each call must return a fresh snapshot; snapshots handed out earlier stay
/// valid for as long as something holds them.
pub trait AstProvider {
    /// Parses `request` into a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unavailable or the source has
    /// errors the provider treats as fatal.
    fn parse(&mut self, request: &ParseRequest) -> Result<TranslationUnit, AstError>;
}

/// Adapts a closure into an [`AstProvider`].
pub struct FnProvider<F> {
    parse: F,
}

impl<F> FnProvider<F>
where
    F: FnMut(&ParseRequest) -> Result<TranslationUnit, AstError>,
{
    pub fn new(parse: F) -> Self {
        Self { parse }
    }
}

impl<F> AstProvider for FnProvider<F>
where
    F: FnMut(&ParseRequest) -> Result<TranslationUnit, AstError>,
{
    fn parse(&mut self, request: &ParseRequest) -> Result<TranslationUnit, AstError> {
        (self.parse)(request)
    }
}
