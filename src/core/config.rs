//! # Configuration Module
//!
//! Site configuration for the `tessera` binary and for any program that
//! prefers declaring its rules over calling [`Site`](crate::Site) directly.
//! Configuration comes from a TOML file, environment variables and
//! programmatic overrides, applied in that order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tessera::core::config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .with_file("tessera.toml")
//!     .with_env_prefix("TESSERA_")
//!     .with_override("output_dir", "public")
//!     .build()
//!     .unwrap();
//!
//! assert!(config.output_path().ends_with("public"));
//! ```
//!
//! A configuration file lists its rules as arrays of tables. Rules of the
//! same kind are applied in the order they appear:
//!
//! ```toml
//! content_dir = "items"
//! key_policy = "strip-extension"
//!
//! [[route]]
//! pattern = "(.*)"
//! to = "${1}/index.html"
//!
//! [[filter]]
//! pattern = ".*"
//! apply = "markdown"
//!
//! [[template]]
//! pattern = ".*"
//! template = "page"
//! ```

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};
use toml::Value as TomlValue;

use crate::core::error::{Result, TesseraError};
use crate::processors;
use crate::site::compile_expression;

/// Default name of the configuration file looked up by the CLI.
pub const CONFIG_FILE_NAME: &str = "tessera.toml";

/// How an item key is derived from its path relative to the content root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
    /// `blog/post.md` becomes `blog/post`.
    #[default]
    StripExtension,
    /// `blog/post.md` stays `blog/post.md`.
    KeepExtension,
}

impl FromStr for KeyPolicy {
    type Err = TesseraError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "strip-extension" => Ok(KeyPolicy::StripExtension),
            "keep-extension" => Ok(KeyPolicy::KeepExtension),
            other => Err(TesseraError::config_error(
                format!("Unknown key policy '{}'", other),
                None,
            )),
        }
    }
}

impl fmt::Display for KeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPolicy::StripExtension => f.write_str("strip-extension"),
            KeyPolicy::KeepExtension => f.write_str("keep-extension"),
        }
    }
}

/// Represents the site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(skip)]
    /// Directory relative paths are resolved against; the directory of the
    /// configuration file when one was loaded.
    pub base_dir: PathBuf,

    #[serde(default = "default_content_dir")]
    /// Directory scanned for items.
    pub content_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    /// Directory rendered items are written to.
    pub output_dir: PathBuf,

    #[serde(default = "default_template_dir")]
    /// Directory holding `*.hbs` templates.
    pub template_dir: PathBuf,

    #[serde(default)]
    /// How item keys are derived from file paths.
    pub key_policy: KeyPolicy,

    #[serde(default)]
    /// Options of the built-in `markdown` filter.
    pub markdown: MarkdownConfig,

    #[serde(default)]
    /// Options of the Handlebars templater.
    pub handlebars: HandlebarsConfig,

    #[serde(default, rename = "route")]
    /// Routing rules, in application order.
    pub routes: Vec<RouteRule>,

    #[serde(default, rename = "filter")]
    /// Filtering rules, in application order.
    pub filters: Vec<FilterRule>,

    #[serde(default, rename = "template")]
    /// Templating rules, in application order.
    pub templates: Vec<TemplateRule>,
}

/// Options of the built-in `markdown` filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownConfig {
    #[serde(default)]
    /// Enables GitHub-style tables.
    pub tables: bool,

    #[serde(default)]
    /// Enables footnotes.
    pub footnotes: bool,

    #[serde(default)]
    /// Enables `~~strikethrough~~`.
    pub strikethrough: bool,
}

/// Options of the Handlebars templater.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlebarsConfig {
    #[serde(default)]
    /// Fails rendering on missing variables instead of printing nothing.
    pub strict_mode: bool,
}

/// Routes matching items to `to`, expanded with the match captures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Expression matched against item keys.
    pub pattern: String,
    /// Route template; `$1` and `${name}` refer to capture groups.
    pub to: String,
}

/// Attaches a built-in filter to matching items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Expression matched against item keys.
    pub pattern: String,
    /// Name of the built-in filter (`markdown`, `title`, `minify`).
    pub apply: String,
}

/// Templates matching items with a Handlebars template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRule {
    /// Expression matched against item keys.
    pub pattern: String,
    /// Template name: the file stem of a `*.hbs` file.
    pub template: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            content_dir: default_content_dir(),
            output_dir: default_output_dir(),
            template_dir: default_template_dir(),
            key_policy: KeyPolicy::default(),
            markdown: MarkdownConfig::default(),
            handlebars: HandlebarsConfig::default(),
            routes: Vec::new(),
            filters: Vec::new(),
            templates: Vec::new(),
        }
    }
}

impl SiteConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }

    /// The content directory, resolved against `base_dir`.
    pub fn content_path(&self) -> PathBuf {
        self.base_dir.join(&self.content_dir)
    }

    /// The output directory, resolved against `base_dir`.
    pub fn output_path(&self) -> PathBuf {
        self.base_dir.join(&self.output_dir)
    }

    /// The template directory, resolved against `base_dir`.
    pub fn template_path(&self) -> PathBuf {
        self.base_dir.join(&self.template_dir)
    }
}

/// Builds a `SiteConfig` from a file, the environment and overrides.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    env_prefix: Option<String>,
    overrides: Vec<(String, TomlValue)>,
}

impl ConfigBuilder {
    /// Initialises a new `ConfigBuilder` instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the given TOML file; its directory becomes the base directory.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the base directory explicitly, taking precedence over the
    /// configuration file's directory.
    pub fn with_base_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.base_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Adds a prefix for environment variables overriding top-level keys
    /// (e.g. `TESSERA_OUTPUT_DIR`).
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Adds a key-value pair to override configuration values.
    ///
    /// Keys are top-level names or `section.name` (e.g. `markdown.tables`).
    /// Overrides apply after the environment, in the order they were added.
    pub fn with_override<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<TomlValue>,
    {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<SiteConfig> {
        let mut config = match &self.config_file {
            Some(path) => load_from_file(path)?,
            None => SiteConfig::default(),
        };

        if let Some(base_dir) = self.base_dir {
            config.base_dir = base_dir;
        }

        if let Some(prefix) = &self.env_prefix {
            apply_env_overrides(&mut config, prefix)?;
        }

        for (key, value) in &self.overrides {
            apply_config_value(&mut config, key, value)?;
        }

        validate_config(&config)?;
        Ok(config)
    }
}

// Internal helper functions

fn load_from_file(path: &Path) -> Result<SiteConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        TesseraError::config_error(
            format!("Failed to read config file: {}", e),
            Some(path.to_path_buf()),
        )
    })?;

    let mut config: SiteConfig = toml::from_str(&content).map_err(|e| {
        TesseraError::config_error(
            format!("Failed to parse config file: {}", e),
            Some(path.to_path_buf()),
        )
    })?;

    config.base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(config)
}

fn apply_env_overrides(config: &mut SiteConfig, prefix: &str) -> Result<()> {
    let values: HashMap<String, String> = env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(prefix).map(|stripped| {
                (stripped.trim_start_matches('_').to_lowercase(), value)
            })
        })
        .collect();

    for key in ["content_dir", "output_dir", "template_dir", "key_policy"] {
        if let Some(value) = values.get(key) {
            debug!("Applying environment override for `{}`", key);
            apply_config_value(
                config,
                key,
                &TomlValue::String(value.clone()),
            )?;
        }
    }
    Ok(())
}

fn apply_config_value(
    config: &mut SiteConfig,
    key: &str,
    value: &TomlValue,
) -> Result<()> {
    let value_str = match value {
        TomlValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    match key {
        "content_dir" => config.content_dir = PathBuf::from(value_str),
        "output_dir" => config.output_dir = PathBuf::from(value_str),
        "template_dir" => config.template_dir = PathBuf::from(value_str),
        "key_policy" => config.key_policy = value_str.parse()?,
        "markdown.tables" => {
            config.markdown.tables = parse_bool(key, &value_str)?
        }
        "markdown.footnotes" => {
            config.markdown.footnotes = parse_bool(key, &value_str)?
        }
        "markdown.strikethrough" => {
            config.markdown.strikethrough = parse_bool(key, &value_str)?
        }
        "handlebars.strict_mode" => {
            config.handlebars.strict_mode = parse_bool(key, &value_str)?
        }
        _ => {
            return Err(TesseraError::config_error(
                format!("Unknown configuration key: {}", key),
                None,
            ));
        }
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.parse().map_err(|e| {
        TesseraError::config_error(
            format!("Invalid {} value '{}': {}", key, value, e),
            None,
        )
    })
}

fn validate_config(config: &SiteConfig) -> Result<()> {
    validate_path(&config.content_path(), "content")?;

    if !config.templates.is_empty() {
        validate_path(&config.template_path(), "template")?;
    }

    let patterns = config
        .routes
        .iter()
        .map(|rule| &rule.pattern)
        .chain(config.filters.iter().map(|rule| &rule.pattern))
        .chain(config.templates.iter().map(|rule| &rule.pattern));
    for pattern in patterns {
        let _ = compile_expression(pattern)?;
    }

    if let Some(rule) = config
        .filters
        .iter()
        .find(|rule| !processors::is_builtin(&rule.apply))
    {
        return Err(TesseraError::config_error(
            format!(
                "Unknown filter '{}' (available: {})",
                rule.apply,
                processors::BUILTIN_FILTERS.join(", ")
            ),
            None,
        ));
    }

    Ok(())
}

fn validate_path(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        return Err(TesseraError::config_error(
            format!("{} directory does not exist: {}", name, path.display()),
            Some(path.to_path_buf()),
        ));
    }

    if !path.is_dir() {
        return Err(TesseraError::config_error(
            format!("{} path is not a directory: {}", name, path.display()),
            Some(path.to_path_buf()),
        ));
    }

    Ok(())
}

// Default value functions
fn default_content_dir() -> PathBuf {
    PathBuf::from("items")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}
