// Copyright © 2024 Tessera. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Tessera CLI
//!
//! Entry point of the `tessera` binary. It parses the command line,
//! initialises the logger and compiles the site found in the working
//! directory.

use env_logger::Env;
use log::info;
use tessera::cli;

/// Log filter used when `RUST_LOG` is unset, chosen by the `-v` count.
fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// The main entry point for the Tessera CLI.
fn main() {
    let matches = cli::build().get_matches();

    env_logger::Builder::from_env(
        Env::default().default_filter_or(default_filter(cli::verbosity(
            &matches,
        ))),
    )
    .init();
    info!("Starting Tessera v{}", cli::VERSION);

    if let Err(err) = cli::execute(&matches) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
