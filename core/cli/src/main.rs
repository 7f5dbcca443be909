#![warn(clippy::pedantic)]

//! # Weaver CLI
//!
//! Command line interface for the pybind11 binding generator.
//!
//! For every selected `[[io]]` section of the configuration the binary
//! parses the inputs, builds the entity tree and writes the generated source
//! to the section's `output` path, creating missing directories.
//!
//! ## Exit codes
//! * 0 – success.
//! * 1 – configuration, parse or emit failure.
//!
//! ## Example
//! ```bash
//! RUST_LOG=weaver=debug weaver bindings.toml --io 0
//! ```
//!
//! Parsing needs libclang: build with `--features libclang`.

mod parser;
use anyhow::{bail, Context};
use clap::Parser;
use parser::Cli;
use std::{fs, path::Path, process};
use tracing_subscriber::{fmt, EnvFilter};
use weaver::{config::MainConfig, default_provider, generate};

fn main() {
    let args = Cli::parse();
    init_logging(args.verbose);
    if let Err(e) = run(&args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "weaver=debug,weaver_ast=debug"
    } else {
        "weaver=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Cli) -> anyhow::Result<()> {
    if !args.config.is_file() {
        bail!("config file not found: {}", args.config.display());
    }
    let path = args
        .config
        .to_str()
        .context("config path is not valid UTF-8")?;
    let config = MainConfig::load(path)?;

    let selected: Vec<_> = match args.io {
        Some(index) => {
            let Some(io) = config.io_configs.get(index) else {
                bail!(
                    "--io {index} is out of range; the configuration has {} [[io]] section(s)",
                    config.io_configs.len()
                );
            };
            vec![io]
        }
        None => config.io_configs.iter().collect(),
    };

    for io in selected {
        let generated = generate(default_provider()?, io.clone())?;
        if args.dump_tree {
            print!("{}", generated.tree);
        }
        if args.stdout {
            print!("{}", generated.source);
        } else {
            write_output(Path::new(&io.output), &generated.source)?;
            println!("Generated: {}", io.output);
        }
    }
    Ok(())
}

fn write_output(path: &Path, source: &str) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }
    fs::write(path, source).with_context(|| format!("failed to write {}", path.display()))
}
