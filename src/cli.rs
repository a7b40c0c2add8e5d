// Copyright © 2024 Tessera. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-line interface for Tessera
//!
//! The `tessera` binary has a single job: find the site configuration in the
//! working directory (or at `--config`), build the configured site and
//! compile it.
//!
//! # Examples
//!
//! ```
//! use std::path::PathBuf;
//! use tessera::cli;
//!
//! let matches = cli::build().get_matches_from(vec![
//!     "tessera",
//!     "-vv",
//!     "compile",
//!     "--config",
//!     "site/tessera.toml",
//! ]);
//!
//! assert_eq!(cli::verbosity(&matches), 2);
//! let compile = matches.subcommand_matches("compile").unwrap();
//! assert_eq!(
//!     compile.get_one::<PathBuf>("config").unwrap(),
//!     &PathBuf::from("site/tessera.toml")
//! );
//! ```

use crate::compiler::CompileReport;
use crate::core::config::{ConfigBuilder, CONFIG_FILE_NAME};
use crate::pipeline::Pipeline;
use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// The current version of Tessera, as defined in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of environment variables overriding top-level configuration keys.
pub const ENV_PREFIX: &str = "TESSERA_";

/// Builds and configures the Tessera command-line interface.
pub fn build() -> Command {
    debug!("Building CLI command structure");

    Command::new("tessera")
        .author("Tessera Contributors")
        .about("A minimal static site build pipeline.")
        .version(VERSION)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase logging verbosity (-v, -vv, -vvv)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("compile")
                .about("Build the site and write every routed item")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Path to the site configuration")
                        .value_parser(value_parser!(PathBuf))
                        .default_value(CONFIG_FILE_NAME),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output directory, overriding the configuration")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .after_help(
            "\x1b[1;4mLicense:\x1b[0m\n  The project is licensed under the terms of \
             both the MIT license and the Apache License (Version 2.0).",
        )
}

/// Number of `-v` flags given on the command line.
pub fn verbosity(matches: &ArgMatches) -> u8 {
    matches.get_count("verbose")
}

/// Executes the subcommand selected in `matches`.
pub fn execute(matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("compile", sub_matches)) => {
            let config = sub_matches
                .get_one::<PathBuf>("config")
                .context("Missing --config value")?;
            let output = sub_matches.get_one::<PathBuf>("output");

            let report = compile_site(config, output.map(PathBuf::as_path))?;
            println!(
                "Compiled {} items ({} skipped)",
                report.written, report.skipped
            );
            Ok(())
        }
        Some((other, _)) => bail!("Unknown command `{}`", other),
        None => bail!("No command provided. Use --help for more information."),
    }
}

/// Loads the configuration at `config_path`, builds the site and compiles
/// it, optionally into `output` instead of the configured directory.
pub fn compile_site(
    config_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<CompileReport> {
    if !config_path.is_file() {
        let dir = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        bail!(
            "A site doesn't seem to exist in {:?}: {:?} not found",
            dir,
            config_path
        );
    }

    let mut builder = ConfigBuilder::new()
        .with_file(config_path)
        .with_env_prefix(ENV_PREFIX);
    if let Some(output) = output {
        builder =
            builder.with_override("output_dir", output.display().to_string());
    }

    let config = builder.build().with_context(|| {
        format!("Failed to load configuration from {:?}", config_path)
    })?;
    info!("Loaded configuration from {:?}", config_path);

    let mut pipeline = Pipeline::from_config(&config)
        .context("Failed to build the site")?;
    let report = pipeline.compile().with_context(|| {
        format!("Failed to compile into {:?}", pipeline.output_path())
    })?;
    Ok(report)
}
