//! The generation unit: one IO section's translation unit and the predicate
//! that decides which cursors belong to the configured inputs.

use std::path::{Component, Path, PathBuf};

use tracing::debug;
use weaver_ast::{
    provider::{AstProvider, ParseRequest},
    translation_unit::{Cursor, TranslationUnit},
};

use crate::{config::IoConfig, errors::WeaverError};

/// Name of the unsaved main file that includes every input.
pub const MAIN_FILE: &str = "weaver_main.cpp";

pub struct GenUnit {
    provider: Box<dyn AstProvider>,
    io: IoConfig,
    main_file: PathBuf,
    search_dirs: Vec<PathBuf>,
    base_source: String,
    extra_source: String,
    tu: TranslationUnit,
}

impl GenUnit {
    /// Parses the inputs of `io`.
    ///
    /// `io` must already be normalized: inputs are used verbatim as
    /// `#include` operands.
    ///
    /// # Errors
    ///
    /// Returns [`WeaverError::Parse`] if the provider fails.
    pub fn new(mut provider: Box<dyn AstProvider>, io: IoConfig) -> Result<Self, WeaverError> {
        let main_file = PathBuf::from(MAIN_FILE);
        let base_source: String = io
            .inputs
            .iter()
            .map(|input| format!("#include {input}\n"))
            .collect();
        let request = ParseRequest::new(&main_file, &base_source, io.cxx_flags());
        let tu = provider
            .parse(&request)
            .map_err(|source| WeaverError::Parse {
                file: main_file.clone(),
                source,
            })?;
        debug!(generation = tu.generation(), inputs = io.inputs.len(), "parsed generation unit");
        let search_dirs = include_dirs(io.cxx_flags());
        Ok(Self {
            provider,
            io,
            main_file,
            search_dirs,
            base_source,
            extra_source: String::new(),
            tu,
        })
    }

    #[must_use]
    pub fn io(&self) -> &IoConfig {
        &self.io
    }

    #[must_use]
    pub fn translation_unit(&self) -> &TranslationUnit {
        &self.tu
    }

    #[must_use]
    pub fn main_file(&self) -> &Path {
        &self.main_file
    }

    /// The source most recently handed to the provider.
    #[must_use]
    pub fn source(&self) -> String {
        format!("{}{}", self.base_source, self.extra_source)
    }

    /// Re-parses the base source with `extra` appended, replacing the
    /// snapshot. Cursors from the previous snapshot stay readable but are
    /// stale from this point on.
    ///
    /// # Errors
    ///
    /// Returns [`WeaverError::Reparse`] if the provider fails; the previous
    /// snapshot is kept in that case.
    pub fn reload_tu(&mut self, extra: &str) -> Result<(), WeaverError> {
        let source = format!("{}{extra}", self.base_source);
        let request = ParseRequest::new(&self.main_file, &source, self.io.cxx_flags());
        let tu = self
            .provider
            .parse(&request)
            .map_err(|source| WeaverError::Reparse {
                file: self.main_file.clone(),
                source,
            })?;
        debug!(
            previous = self.tu.generation(),
            generation = tu.generation(),
            "re-parsed generation unit"
        );
        self.extra_source = extra.to_string();
        self.tu = tu;
        Ok(())
    }

    /// `true` if `cursor` is declared in the main file or in one of the
    /// configured inputs.
    ///
    /// An input matches a file when the file is the input resolved against
    /// the working directory or against one of the `-I` directories of the
    /// flags. Without any `-I` directory the file only has to end with the
    /// input's path components, so a same-named header elsewhere on the
    /// system include path is taken as an input too.
    ///
    /// # Panics
    ///
    /// Panics if `cursor` comes from a snapshot other than the current one.
    #[must_use]
    pub fn is_cursor_in_inputs(&self, cursor: &Cursor) -> bool {
        assert_eq!(
            cursor.translation_unit().generation(),
            self.tu.generation(),
            "cursor from a replaced translation unit"
        );
        let Some(location) = cursor.location() else {
            return false;
        };
        if location.file == self.main_file {
            return true;
        }
        let file = lexically_normal(&location.file);
        self.io
            .inputs
            .iter()
            .filter_map(|input| unquote(input))
            .any(|input| self.resolves_to(Path::new(input), &file))
    }

    fn resolves_to(&self, input: &Path, file: &Path) -> bool {
        if self.search_dirs.is_empty() {
            return file.ends_with(input);
        }
        lexically_normal(input) == file
            || self
                .search_dirs
                .iter()
                .any(|dir| lexically_normal(&dir.join(input)) == file)
    }
}

/// Directories named by `-I<dir>` or `-I <dir>`.
fn include_dirs(flags: &[String]) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut flags = flags.iter();
    while let Some(flag) = flags.next() {
        match flag.strip_prefix("-I") {
            Some("") => dirs.extend(flags.next().map(PathBuf::from)),
            Some(dir) => dirs.push(PathBuf::from(dir)),
            None => {}
        }
    }
    dirs
}

/// Drops `.` components and folds `..` into its parent without touching
/// the filesystem.
fn lexically_normal(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir
                if matches!(out.components().next_back(), Some(Component::Normal(_))) =>
            {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn unquote(input: &str) -> Option<&str> {
    input
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .or_else(|| {
            input
                .strip_prefix('<')
                .and_then(|rest| rest.strip_suffix('>'))
        })
}
