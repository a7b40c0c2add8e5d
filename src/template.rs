// Copyright © 2024 Tessera. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Handlebars Templates
//!
//! A [`TemplateRegistry`] holds the Handlebars templates of a site and turns
//! them into templaters that can be attached to items. Templates are loaded
//! from `*.hbs` files and registered under their file stem, so
//! `templates/page.hbs` becomes the template `page`.
//!
//! Every template is rendered against the same context:
//!
//! | Field          | Value                                   |
//! |----------------|-----------------------------------------|
//! | `key`          | the item key                            |
//! | `content`      | the filtered content                    |
//! | `metadata`     | the front-matter object                 |
//! | `route`        | the route, or `null`                    |
//! | `pretty_route` | the route with `/index.html` cut to `/`, or `null` |
//!
//! Handlebars escapes HTML in `{{...}}`; use `{{{content}}}` to emit
//! rendered markup unchanged.

use crate::core::error::{Result, TesseraError};
use crate::item::{Item, TemplateFn};
use handlebars::Handlebars;
use log::debug;
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// File extension of template files.
pub const TEMPLATE_EXTENSION: &str = "hbs";

/// A set of named Handlebars templates.
pub struct TemplateRegistry {
    engine: Handlebars<'static>,
    template_dir: Option<PathBuf>,
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> =
            self.engine.get_templates().keys().collect();
        names.sort();
        f.debug_struct("TemplateRegistry")
            .field("template_dir", &self.template_dir)
            .field("templates", &names)
            .field("strict_mode", &self.engine.strict_mode())
            .finish()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let mut engine = Handlebars::new();
        engine.register_escape_fn(handlebars::html_escape);
        Self {
            engine,
            template_dir: None,
        }
    }

    /// Creates a registry holding every `*.hbs` file directly inside
    /// `template_dir`.
    ///
    /// # Errors
    ///
    /// Returns `TesseraError::Template` if the directory cannot be read or a
    /// template does not parse.
    pub fn from_dir(template_dir: impl AsRef<Path>) -> Result<Self> {
        let mut registry = Self::new();
        registry.load_templates(template_dir.as_ref())?;
        registry.template_dir = Some(template_dir.as_ref().to_path_buf());
        Ok(registry)
    }

    /// Enables or disables strict mode, in which referencing a missing field
    /// is a render error.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.engine.set_strict_mode(strict);
        self
    }

    /// Directory the templates were loaded from, if any.
    pub fn template_dir(&self) -> Option<&Path> {
        self.template_dir.as_deref()
    }

    /// Whether a template called `name` is registered.
    pub fn has_template(&self, name: &str) -> bool {
        self.engine.has_template(name)
    }

    /// Registers a template from a string, replacing any template with the
    /// same name.
    pub fn register_template(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<()> {
        self.engine
            .register_template_string(name, source)
            .map_err(|e| {
                TesseraError::template_error(
                    format!("Failed to register template: {}", e),
                    name,
                    Some(Box::new(e)),
                )
            })
    }

    fn load_templates(&mut self, template_dir: &Path) -> Result<()> {
        let entries = std::fs::read_dir(template_dir).map_err(|e| {
            TesseraError::template_error(
                format!("Failed to read template directory: {}", e),
                template_dir.display().to_string(),
                Some(Box::new(e)),
            )
        })?;

        for entry in entries {
            let path = entry
                .map_err(|e| {
                    TesseraError::template_error(
                        format!("Failed to read directory entry: {}", e),
                        template_dir.display().to_string(),
                        Some(Box::new(e)),
                    )
                })?
                .path();

            if !path.is_file()
                || path.extension().and_then(|s| s.to_str())
                    != Some(TEMPLATE_EXTENSION)
            {
                continue;
            }

            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    TesseraError::template_error(
                        "Invalid template filename",
                        path.display().to_string(),
                        None,
                    )
                })?
                .to_string();

            let source = std::fs::read_to_string(&path).map_err(|e| {
                TesseraError::template_error(
                    format!("Failed to read template file: {}", e),
                    path.display().to_string(),
                    Some(Box::new(e)),
                )
            })?;

            self.register_template(&name, &source)?;
            debug!("Loaded template `{}` from {:?}", name, path);
        }

        Ok(())
    }

    /// Builds the render context for `item`.
    pub fn context(item: &Item) -> JsonValue {
        json!({
            "key": item.key(),
            "content": item.filtered_content(),
            "metadata": item.metadata(),
            "route": item.route(),
            "pretty_route": item.pretty_route(),
        })
    }

    /// Renders the template `name` for `item`.
    ///
    /// The item is expected to be filtered already; this reads its filtered
    /// content as is.
    pub fn render(&self, name: &str, item: &Item) -> Result<String> {
        self.engine
            .render(name, &Self::context(item))
            .map_err(|e| {
                TesseraError::template_error(
                    format!("Failed to render `{}`: {}", item.key(), e),
                    name,
                    Some(Box::new(e)),
                )
            })
    }

    /// Returns a templater rendering the template `name`.
    ///
    /// # Errors
    ///
    /// Returns `TesseraError::Template` if no such template is registered.
    pub fn templater(
        registry: &Rc<Self>,
        name: &str,
    ) -> Result<TemplateFn> {
        if !registry.has_template(name) {
            return Err(TesseraError::template_error(
                "Template not found",
                name,
                None,
            ));
        }

        let registry = Rc::clone(registry);
        let name = name.to_string();
        let templater: TemplateFn =
            Rc::new(move |item: &Item| registry.render(&name, item));
        Ok(templater)
    }
}
