// Copyright © 2024 Tessera. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build script that refuses to compile on toolchains older than the
//! declared minimum supported Rust version.

/// Minimum supported Rust version, kept in sync with `rust-version`.
const MIN_RUST_VERSION: &str = "1.74.0";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if version_check::is_min_version(MIN_RUST_VERSION) != Some(true) {
        eprintln!(
            "tessera requires Rust {} or newer; please update your toolchain.",
            MIN_RUST_VERSION
        );
        std::process::exit(1);
    }
}
