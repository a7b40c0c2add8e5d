// Copyright © 2024 Tessera. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Configured Pipelines
//!
//! A [`Pipeline`] is a [`Site`] whose routes, filters and templates were
//! applied from a [`SiteConfig`] instead of code. Rules are applied kind by
//! kind (routes, then filters, then templates), each kind in file order, so
//! the usual overwrite and accumulate semantics of [`Site`] hold.

use crate::compiler::{CompileReport, Compiler};
use crate::core::config::SiteConfig;
use crate::core::error::Result;
use crate::processors;
use crate::site::Site;
use crate::template::TemplateRegistry;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A site configured from declarative rules, ready to compile.
#[derive(Debug)]
pub struct Pipeline {
    site: Site,
    output_path: PathBuf,
}

impl Pipeline {
    /// Scans the content directory of `config` and applies its rules.
    ///
    /// Route targets are expanded with the captures of the match, so
    /// `to = "${1}/index.html"` places the first group in a directory.
    ///
    /// # Errors
    ///
    /// Fails if the site cannot be scanned, a pattern is invalid, a filter
    /// name is unknown, or templates cannot be loaded.
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        let mut site = Site::with_key_policy(
            &config.base_dir,
            config.content_path(),
            config.key_policy,
        )?;

        for rule in &config.routes {
            let matched = site.route(&rule.pattern, |captures, _| {
                let mut route = String::new();
                captures.expand(&rule.to, &mut route);
                route
            })?;
            debug!(
                "Route `{}` -> `{}`: {} items",
                rule.pattern, rule.to, matched
            );
        }

        for rule in &config.filters {
            let filter = processors::builtin(&rule.apply, &config.markdown)?;
            let matched =
                site.filter(&rule.pattern, move |item| filter.apply(item))?;
            debug!(
                "Filter `{}` ({}): {} items",
                rule.pattern, rule.apply, matched
            );
        }

        if !config.templates.is_empty() {
            let registry = Rc::new(
                TemplateRegistry::from_dir(config.template_path())?
                    .with_strict_mode(config.handlebars.strict_mode),
            );
            for rule in &config.templates {
                let templater =
                    TemplateRegistry::templater(&registry, &rule.template)?;
                let matched = site.template_with(&rule.pattern, templater)?;
                debug!(
                    "Template `{}` ({}): {} items",
                    rule.pattern, rule.template, matched
                );
            }
        }

        info!(
            "Configured {} items from {:?}",
            site.len(),
            site.items_path()
        );

        Ok(Self {
            site,
            output_path: config.output_path(),
        })
    }

    /// The configured site.
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Mutable access to the site, for rules that cannot be declared.
    pub fn site_mut(&mut self) -> &mut Site {
        &mut self.site
    }

    /// Root directory of the output.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Compiles the site into the output directory.
    pub fn compile(&mut self) -> Result<CompileReport> {
        Compiler::new(&mut self.site, self.output_path.clone()).compile()
    }
}
