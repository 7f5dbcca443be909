//! Scenario tests for the weaver pipeline.
//!
//! Every test describes the parsed headers with `TuBuilder` fixtures, so the
//! suite needs neither libclang nor a C++ compiler.

#[cfg(test)]
mod utils;

mod emission;
mod normalization;
mod pipeline;
mod tree;
