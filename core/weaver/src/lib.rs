#![warn(clippy::pedantic)]
//! Orchestration crate for the weaver binding generator.
//!
//! Weaver reads C++ headers and writes the pybind11 registration code that
//! exposes their declarations to Python. The pipeline for one `[[io]]`
//! configuration section is:
//!
//! ```text
//! IoConfig → GenUnit (parse) → normalize templates (maybe re-parse)
//!          → EntityTree → linearize → C++ source
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use weaver::{config::MainConfig, generate, default_provider};
//!
//! fn run(config_path: &str) -> anyhow::Result<()> {
//!     let config = MainConfig::load(config_path)?;
//!     for io in &config.io_configs {
//!         let generated = generate(default_provider()?, io.clone())?;
//!         std::fs::write(&io.output, generated.source)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Phases
//!
//! ### Parse
//!
//! [`GenUnit`](gen_unit::GenUnit) includes every configured input from an
//! unsaved main file and hands it to an
//! [`AstProvider`](weaver_ast::provider::AstProvider). With the `libclang`
//! feature the provider is libclang; tests and other front ends supply
//! snapshots built with [`TuBuilder`](weaver_ast::builder::TuBuilder).
//!
//! ### Normalize
//!
//! Class template specializations that are used but never declared have no
//! cursor a binding could be attached to. The
//! [`normalizer`] writes an `extern template` declaration for each one and
//! re-parses once, so they show up as ordinary classes.
//!
//! ### Build the tree
//!
//! [`EntityTree::build`](entity_tree::EntityTree::build) walks the snapshot
//! breadth first and creates one [`Entity`](entity::Entity) per bindable
//! declaration. Reopened namespaces are merged; any other repeated scope key
//! is a redeclaration, reported as a warning and otherwise ignored.
//!
//! ### Emit
//!
//! [`emitter::emit`] orders entities so that parents and base classes are
//! registered first and writes the declaration function.
//!
//! ## Error Handling
//!
//! Library modules return [`WeaverError`](errors::WeaverError); the
//! functions in this module wrap them in `anyhow` with the IO section they
//! belong to. Redeclarations and unsupported template uses are not errors;
//! they are available from [`EntityTree::diagnostics`](entity_tree::EntityTree::diagnostics).

use anyhow::Context;
use tracing::{info, warn};
use weaver_ast::provider::AstProvider;

use crate::{
    config::IoConfig,
    diagnostics::Severity,
    entity_tree::EntityTree,
    gen_unit::GenUnit,
    pass_state::PassState,
};

pub mod config;
pub mod diagnostics;
pub mod emitter;
pub mod entity;
pub mod entity_tree;
pub mod errors;
pub mod gen_unit;
pub mod normalizer;
pub mod pass_state;

/// Output of one IO section.
#[derive(Debug)]
pub struct Generated {
    pub tree: EntityTree,
    pub source: String,
}

/// The provider used when none is supplied: libclang when the crate is built
/// with the `libclang` feature.
///
/// # Errors
///
/// Returns an error if libclang cannot be loaded, or if the crate was built
/// without the `libclang` feature.
#[cfg(feature = "libclang")]
pub fn default_provider() -> anyhow::Result<Box<dyn AstProvider>> {
    let provider = weaver_ast::clang::ClangProvider::new().context("failed to load libclang")?;
    Ok(Box::new(provider))
}

/// The provider used when none is supplied: libclang when the crate is built
/// with the `libclang` feature.
///
/// # Errors
///
/// Returns an error if libclang cannot be loaded, or if the crate was built
/// without the `libclang` feature.
#[cfg(not(feature = "libclang"))]
pub fn default_provider() -> anyhow::Result<Box<dyn AstProvider>> {
    anyhow::bail!("weaver was built without libclang support; rebuild with `--features libclang`")
}

/// Parses the inputs of a normalized IO section.
///
/// # Errors
///
/// Returns an error if the provider fails to parse the inputs.
pub fn parse_unit(provider: Box<dyn AstProvider>, io: IoConfig) -> anyhow::Result<GenUnit> {
    let output = io.output.clone();
    GenUnit::new(provider, io).with_context(|| format!("failed to parse inputs for {output}"))
}

/// Normalizes template instantiations and builds the entity tree.
///
/// Diagnostics are logged as they are found and kept on the returned tree.
///
/// # Errors
///
/// Returns an error if the re-parse with synthesized instantiations fails.
pub fn build_tree(gu: &mut GenUnit) -> anyhow::Result<EntityTree> {
    let mut state = PassState::new();
    let tree = EntityTree::build(gu, &mut state)
        .with_context(|| format!("failed to build entity tree for {}", gu.io().output))?;
    let warnings = tree
        .diagnostics()
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Warning)
        .count();
    if warnings > 0 {
        warn!(warnings, output = %gu.io().output, "entity tree built with warnings");
    }
    Ok(tree)
}

/// Runs the whole pipeline for one IO section.
///
/// # Errors
///
/// Returns an error if parsing, re-parsing or dependency ordering fails.
pub fn generate(provider: Box<dyn AstProvider>, io: IoConfig) -> anyhow::Result<Generated> {
    let mut gu = parse_unit(provider, io)?;
    let tree = build_tree(&mut gu)?;
    let source = emitter::emit(&tree, gu.io())
        .with_context(|| format!("failed to emit {}", gu.io().output))?;
    info!(entities = tree.len(), output = %gu.io().output, "generated bindings");
    Ok(Generated { tree, source })
}
