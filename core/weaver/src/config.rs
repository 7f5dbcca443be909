//! Generator configuration.
//!
//! Configuration is TOML with one optional `[common]` table and one or more
//! `[[io]]` tables, one per generated binding file:
//!
//! ```toml
//! [common]
//! compiler = "clang++"
//! cxx_flags = ["-std=c++17"]
//! include_directories = ["${CFG_DIR}/include"]
//!
//! [[io]]
//! inputs = ["${CFG_DIR}/include/api.h", "<vector>"]
//! output = "gen/api_binding.cc"
//! decl_fn_name = "DeclApi"
//! ```
//!
//! `${CFG_DIR}` expands to the absolute directory of the configuration file
//! when the configuration is loaded from a file.
//!
//! Loading normalizes everything the generation unit needs: system include
//! directories of the host compiler are discovered, every input becomes a
//! valid `#include` operand, and per-IO compiler flags are computed.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::WeaverError;

const CFG_DIR_VAR: &str = "${CFG_DIR}";
const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "inl"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CommonConfig {
    /// Compiler used to discover system include directories; when empty,
    /// `$CXX`, `c++`, `g++` and `clang++` are tried in that order.
    pub compiler: String,
    pub cxx_flags: Vec<String>,
    pub include_directories: Vec<String>,
}

impl CommonConfig {
    /// Appends `-I` flags for the host compiler's system include directories,
    /// then for every configured include directory.
    pub fn normalize(&mut self) {
        let (compiler, system_includes) = probe_system_includes(&self.compiler_candidates());
        if let Some(compiler) = compiler {
            self.compiler = compiler;
        }
        self.normalize_with(&system_includes);
    }

    /// Same as [`CommonConfig::normalize`] with an already known list of
    /// system include directories.
    pub fn normalize_with(&mut self, system_includes: &[String]) {
        let system = system_includes.iter().map(|dir| format!("-I{dir}"));
        let user = self.include_directories.iter().map(|dir| format!("-I{dir}"));
        let flags: Vec<String> = system.chain(user).collect();
        self.cxx_flags.extend(flags);
    }

    fn compiler_candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        if !self.compiler.is_empty() {
            candidates.push(self.compiler.clone());
        }
        if let Ok(cxx) = std::env::var("CXX")
            && !cxx.is_empty()
        {
            candidates.push(cxx);
        }
        candidates.extend(["c++", "g++", "clang++"].map(String::from));
        candidates
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IoConfig {
    pub inputs: Vec<String>,
    pub output: String,
    pub decl_fn_name: String,
    /// Python submodule (dotted) that receives the top-level entities; empty
    /// means the module passed to the declaration function.
    pub root_module_namespace: String,
    pub extra_cxx_flags: Vec<String>,
    pub gen_docstring: bool,
    pub strict_visibility_mode: bool,
    #[serde(skip)]
    pub(crate) cxx_flags: Vec<String>,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: String::new(),
            decl_fn_name: String::from("DeclFn"),
            root_module_namespace: String::new(),
            extra_cxx_flags: Vec::new(),
            gen_docstring: true,
            strict_visibility_mode: false,
            cxx_flags: Vec::new(),
        }
    }
}

impl IoConfig {
    /// Validates the section and prepares inputs and flags for parsing.
    ///
    /// # Errors
    ///
    /// Returns [`WeaverError::Config`] if `inputs` or `output` is empty and
    /// [`WeaverError::InputWalk`] if an input directory cannot be read.
    pub fn normalize(&mut self, common: &CommonConfig) -> Result<(), WeaverError> {
        if self.inputs.is_empty() || self.output.is_empty() {
            return Err(WeaverError::config("inputs and output can not be empty"));
        }
        self.cxx_flags = common
            .cxx_flags
            .iter()
            .chain(&self.extra_cxx_flags)
            .cloned()
            .collect();
        let inputs = to_include_operands(&self.inputs)?;
        let prefixes = absolute_include_dirs(&self.cxx_flags);
        self.inputs = inputs
            .into_iter()
            .map(|input| relative_to_include_dirs(&input, &prefixes))
            .collect();
        Ok(())
    }

    /// Common flags followed by this section's extra flags; empty before
    /// [`IoConfig::normalize`].
    #[must_use]
    pub fn cxx_flags(&self) -> &[String] {
        &self.cxx_flags
    }

    /// Sets the effective compiler flags directly.
    #[must_use]
    pub fn with_cxx_flags(mut self, flags: Vec<String>) -> Self {
        self.cxx_flags = flags;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MainConfig {
    #[serde(rename = "common")]
    pub common_config: CommonConfig,
    #[serde(rename = "io")]
    pub io_configs: Vec<IoConfig>,
}

impl MainConfig {
    /// Loads and normalizes a configuration.
    ///
    /// `file_or_content` is read as a file when such a file exists, otherwise
    /// it is parsed as TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is empty, the file cannot be read,
    /// the TOML is malformed, no `[[io]]` section is present, or any section
    /// fails to normalize.
    pub fn load(file_or_content: &str) -> Result<Self, WeaverError> {
        Self::load_with(file_or_content, CommonConfig::normalize)
    }

    /// Like [`MainConfig::load`], with a custom normalization step for the
    /// common section.
    ///
    /// # Errors
    ///
    /// See [`MainConfig::load`].
    pub fn load_with<F>(file_or_content: &str, normalize_common: F) -> Result<Self, WeaverError>
    where
        F: FnOnce(&mut CommonConfig),
    {
        if file_or_content.is_empty() {
            return Err(WeaverError::config("file_or_content can not be empty"));
        }
        let content = read_if_file(file_or_content)?;
        let mut config = Self::parse(&content)?;
        normalize_common(&mut config.common_config);
        for io_config in &mut config.io_configs {
            io_config.normalize(&config.common_config)?;
        }
        if config.io_configs.is_empty() {
            return Err(WeaverError::config("no [[io]] section is specified"));
        }
        Ok(config)
    }

    /// Parses TOML text without normalizing it.
    ///
    /// # Errors
    ///
    /// Returns [`WeaverError::ConfigSyntax`] for malformed TOML or unknown keys.
    pub fn parse(content: &str) -> Result<Self, WeaverError> {
        toml::from_str(content).map_err(|source| WeaverError::ConfigSyntax { source })
    }
}

fn read_if_file(file_or_content: &str) -> Result<String, WeaverError> {
    let path = Path::new(file_or_content);
    if !path.is_file() {
        return Ok(file_or_content.to_string());
    }
    let content = std::fs::read_to_string(path).map_err(|source| WeaverError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let absolute = std::path::absolute(path).map_err(|source| WeaverError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg_dir = absolute
        .parent()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(content.replace(CFG_DIR_VAR, &cfg_dir))
}

/// Turns configured inputs into `#include` operands.
///
/// `"quoted"` and `<angled>` entries are kept, directories expand to the
/// headers beneath them in sorted order, anything else is quoted.
fn to_include_operands(inputs: &[String]) -> Result<Vec<String>, WeaverError> {
    let mut operands = Vec::new();
    for input in inputs {
        if input.starts_with('"') || input.starts_with('<') {
            operands.push(input.clone());
        } else if Path::new(input).is_dir() {
            operands.extend(headers_under(Path::new(input))?);
        } else {
            operands.push(format!("\"{input}\""));
        }
    }
    Ok(operands)
}

fn headers_under(dir: &Path) -> Result<Vec<String>, WeaverError> {
    let mut headers = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| WeaverError::InputWalk {
            path: dir.to_path_buf(),
            source,
        })?;
        let is_header = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| HEADER_EXTENSIONS.contains(&ext));
        if entry.file_type().is_file() && is_header {
            headers.push(format!("\"{}\"", entry.path().display()));
        }
    }
    debug!(dir = %dir.display(), count = headers.len(), "expanded input directory");
    Ok(headers)
}

fn absolute_include_dirs(flags: &[String]) -> Vec<PathBuf> {
    flags
        .iter()
        .filter_map(|flag| flag.strip_prefix("-I"))
        .map(Path::new)
        .filter(|dir| dir.is_absolute())
        .map(Path::to_path_buf)
        .collect()
}

/// Rewrites a quoted absolute path relative to the first absolute include
/// directory containing it.
fn relative_to_include_dirs(operand: &str, prefixes: &[PathBuf]) -> String {
    let Some(inner) = operand
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return operand.to_string();
    };
    let path = Path::new(inner);
    if !path.is_absolute() {
        return operand.to_string();
    }
    prefixes
        .iter()
        .find_map(|prefix| path.strip_prefix(prefix).ok())
        .map_or_else(
            || operand.to_string(),
            |relative| format!("\"{}\"", relative.display()),
        )
}

/// Runs the first available compiler in `candidates` in verbose
/// preprocess-only mode and collects its `#include <...>` search list.
fn probe_system_includes(candidates: &[String]) -> (Option<String>, Vec<String>) {
    for candidate in candidates {
        let Ok(path) = which::which(candidate) else {
            continue;
        };
        let output = Command::new(&path)
            .args(["-E", "-x", "c++", "-", "-v"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();
        let Ok(output) = output else {
            continue;
        };
        let includes = parse_search_list(&String::from_utf8_lossy(&output.stderr));
        if !includes.is_empty() {
            debug!(compiler = %candidate, count = includes.len(), "discovered system include directories");
            return (Some(candidate.clone()), includes);
        }
    }
    (None, Vec::new())
}

fn parse_search_list(verbose_output: &str) -> Vec<String> {
    verbose_output
        .lines()
        .skip_while(|line| !line.starts_with("#include <...> search starts here:"))
        .skip(1)
        .take_while(|line| !line.starts_with("End of search list."))
        .map(|line| line.trim().trim_end_matches(" (framework directory)").to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
