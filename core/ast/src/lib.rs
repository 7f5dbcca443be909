#![warn(clippy::pedantic)]
//! Translation unit snapshots for the binding generator.
//!
//! A parse produces an immutable [`TranslationUnit`]; the [`Cursor`] and
//! [`Type`] handles obtained from it keep the snapshot alive. Parsing itself
//! sits behind the [`AstProvider`] trait so that the generator can run on
//! libclang (feature `libclang`) or on snapshots assembled with
//! [`TuBuilder`].
//!
//! [`TranslationUnit`]: translation_unit::TranslationUnit
//! [`Cursor`]: translation_unit::Cursor
//! [`Type`]: translation_unit::Type
//! [`AstProvider`]: provider::AstProvider
//! [`TuBuilder`]: builder::TuBuilder
pub mod arena;
pub mod builder;
#[cfg(feature = "libclang")]
pub mod clang;
pub(crate) mod enums_impl;
pub mod errors;
pub mod nodes;
pub(crate) mod nodes_impl;
pub mod provider;
pub mod translation_unit;
