// Copyright © 2024 Tessera. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Compiler
//!
//! Writes the templated content of every routed item of a [`Site`] below an
//! output directory. Items without a route are skipped with a warning.
//!
//! A compile pass stops at the first error; files written before it stay on
//! disk.

use crate::core::error::{Result, TesseraError};
use crate::site::Site;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Counts produced by a successful compile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Number of files written.
    pub written: usize,
    /// Number of items skipped because they have no route.
    pub skipped: usize,
}

/// Renders a site to disk.
#[derive(Debug)]
pub struct Compiler<'s> {
    site: &'s mut Site,
    output_path: PathBuf,
}

impl<'s> Compiler<'s> {
    /// Creates a compiler writing `site` below `output_path`.
    pub fn new(site: &'s mut Site, output_path: impl Into<PathBuf>) -> Self {
        Self {
            site,
            output_path: output_path.into(),
        }
    }

    /// The site being compiled.
    pub fn site(&self) -> &Site {
        &*self.site
    }

    /// Root directory of the output.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Runs one compile pass.
    ///
    /// Creates the output root if needed, then for each item in key order
    /// renders its templated content and writes it to `output_path/route`,
    /// creating missing parent directories and replacing existing files.
    ///
    /// # Errors
    ///
    /// - `TesseraError::CompileIo` if a directory cannot be created or a file
    ///   cannot be written.
    /// - `TesseraError::InvalidRoute` if a route is absolute or climbs out of
    ///   the output root.
    /// - Any error returned by an item's filters or templater, unchanged.
    pub fn compile(&mut self) -> Result<CompileReport> {
        fs::create_dir_all(&self.output_path).map_err(|e| {
            TesseraError::compile_io(&self.output_path, e)
        })?;

        let mut report = CompileReport::default();
        let mut destinations = HashSet::new();

        for (key, item) in self.site.items_mut() {
            let content = item.templated()?;

            let route = match item.route() {
                Some(route) if !route.is_empty() => route,
                _ => {
                    warn!("Skipping `{}`: no route assigned", key);
                    report.skipped += 1;
                    continue;
                }
            };

            if !is_relative_route(route) {
                return Err(TesseraError::InvalidRoute {
                    key: key.clone(),
                    route: route.to_string(),
                });
            }

            let destination = self.output_path.join(route);
            if !destinations.insert(destination.clone()) {
                warn!(
                    "`{}` overwrites output already written to {:?}",
                    key, destination
                );
            }

            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| TesseraError::compile_io(parent, e))?;
            }
            fs::write(&destination, content.as_bytes())
                .map_err(|e| TesseraError::compile_io(&destination, e))?;

            debug!("Wrote `{}` to {:?}", key, destination);
            report.written += 1;
        }

        info!(
            "Compiled {} items into {:?} ({} skipped)",
            report.written, self.output_path, report.skipped
        );
        Ok(report)
    }
}

/// Whether `route` names a file below the directory it is joined to.
fn is_relative_route(route: &str) -> bool {
    let path = Path::new(route);
    !route.ends_with('/')
        && !route.ends_with("/.")
        && matches!(path.components().last(), Some(Component::Normal(_)))
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
