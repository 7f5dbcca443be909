//! Command line argument parsing for the weaver binary.

use clap::Parser;

/// Command line interface definition for `weaver`.
///
/// Every `[[io]]` section of the configuration is generated unless `--io`
/// selects one of them.
///
/// ## Examples
///
/// Generate every section:
/// ```bash
/// weaver bindings.toml
/// ```
///
/// Print the second section's source and entity tree instead of writing it:
/// ```bash
/// weaver bindings.toml --io 1 --stdout --dump-tree
/// ```
#[derive(Parser)]
#[command(
    name = "weaver",
    author,
    version,
    about = "Generates pybind11 registration code from C++ headers",
    long_about = "The 'weaver' command parses the headers listed in each [[io]] section of a TOML \
configuration and writes a C++ source file with a declaration function that registers their \
namespaces, classes, enums, functions and variables with pybind11."
)]
pub(crate) struct Cli {
    /// Path to the TOML configuration file.
    pub(crate) config: std::path::PathBuf,

    /// Only generate the `[[io]]` section with this zero-based index.
    #[clap(long = "io", value_name = "INDEX")]
    pub(crate) io: Option<usize>,

    /// Print the entity tree of each generated section to stdout.
    #[clap(long = "dump-tree", action = clap::ArgAction::SetTrue)]
    pub(crate) dump_tree: bool,

    /// Print generated sources to stdout instead of writing the output files.
    #[clap(long = "stdout", action = clap::ArgAction::SetTrue)]
    pub(crate) stdout: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::SetTrue)]
    pub(crate) verbose: bool,
}
