// Copyright © 2024 Tessera. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Tessera Library
//!
//! Tessera is a small static-site pipeline. A [`Site`] scans a directory of
//! content files into [`Item`]s keyed by their relative path. Routes,
//! filters and templaters are attached to items by matching regular
//! expressions against those keys, and a [`Compiler`] renders every routed
//! item to disk.
//!
//! Filtering is lazy: an item's filters run once, the first time its
//! content is needed. Templaters run every time the templated output is
//! requested.

#![doc = include_str!("../README.md")]
#![crate_name = "tessera"]
#![crate_type = "lib"]

/// Module containing core utilities, such as configuration and error handling.
pub mod core {
    /// Declarative site configuration loaded from `tessera.toml`.
    pub mod config;
    /// Contains error types and handling for Tessera.
    pub mod error;
}

/// Command-line interface of the `tessera` binary.
pub mod cli;

/// Compiles a site's routed items to disk.
pub mod compiler;

/// Front-matter parsing.
pub mod content;

/// The item data model and its lazy evaluation.
pub mod item;

/// Sites configured from a [`SiteConfig`].
pub mod pipeline;

/// Built-in filters.
pub mod processors;

/// Content scanning and expression-based configuration.
pub mod site;

/// Handlebars templating.
pub mod template;

pub use crate::compiler::{CompileReport, Compiler};
pub use crate::core::config::{KeyPolicy, SiteConfig};
pub use crate::core::error::{Result, TesseraError};
pub use crate::item::Item;
pub use crate::pipeline::Pipeline;
pub use crate::site::Site;
