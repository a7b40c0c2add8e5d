//! # Error Handling for Tessera
//!
//! This module defines the error type shared by every stage of the
//! pipeline: scanning the content tree, parsing front matter, matching
//! expressions, running filters and templaters, and writing output. The
//! `thiserror` crate derives the `Display` and `Error` implementations.

use std::path::PathBuf;
use thiserror::Error;

/// A unified result type for the Tessera library.
///
/// This type alias simplifies function signatures by defining a result type
/// that always uses `TesseraError` as the error variant.
pub type Result<T> = std::result::Result<T, TesseraError>;

/// The main error type for Tessera, encompassing all potential error cases.
///
/// Scan, metadata and pattern errors surface while the site is being built;
/// route and I/O errors surface during compilation and abort the remaining
/// pass. Errors returned by user filters and templaters travel through
/// unchanged.
#[derive(Error, Debug)]
pub enum TesseraError {
    /// A file or directory under the content root could not be walked or read.
    ///
    /// This includes content that is not valid UTF-8.
    #[error("Failed to scan `{path:?}`: {source}")]
    Scan {
        /// Path that could not be read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A content path cannot be turned into a key (not UTF-8, or not a
    /// plain relative path).
    #[error("Path `{path:?}` cannot form an item key.")]
    InvalidKeyPath {
        /// The offending path.
        path: PathBuf,
    },

    /// Two content files derive the same key.
    #[error("Duplicate item key `{key}` derived from `{path:?}`.")]
    DuplicateKey {
        /// The key both files map to.
        key: String,
        /// Path of the second file.
        path: PathBuf,
    },

    /// A front-matter block is present but is not a JSON object.
    #[error("Invalid front matter in `{key}`: {source}")]
    MetadataParse {
        /// Key of the item being constructed.
        key: String,
        /// The JSON decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// A match expression is not a valid regular expression.
    #[error("Invalid match expression `{expression}`: {source}")]
    Pattern {
        /// The expression as supplied by the caller.
        expression: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// An item route would place its output outside the output root.
    #[error("Route `{route}` of item `{key}` escapes the output directory.")]
    InvalidRoute {
        /// Key of the routed item.
        key: String,
        /// The rejected route.
        route: String,
    },

    /// Creating an output directory or writing an output file failed.
    #[error("Failed to write `{path:?}`: {source}")]
    CompileIo {
        /// Path of the directory or file being written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Error related to configuration loading or validation.
    #[error("Configuration error: {message}.")]
    Config {
        /// Detailed description of the configuration error.
        message: String,
        /// Optional path of the configuration file that caused the error.
        path: Option<PathBuf>,
    },

    /// Error related to template loading or rendering.
    #[error("Template rendering error: {message} in template `{template}`.")]
    Template {
        /// Description of the template error.
        message: String,
        /// The template name or file associated with the error.
        template: String,
        /// Optional source error providing additional context.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error raised while filtering an item's content.
    #[error("Filter error: {message}.")]
    Filter {
        /// Description of the failure.
        message: String,
        /// Optional source error providing additional context.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TesseraError {
    /// Wraps an IO error raised while reading the content tree.
    pub fn scan(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TesseraError::Scan {
            path: path.into(),
            source,
        }
    }

    /// Wraps an IO error raised while writing output.
    pub fn compile_io(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        TesseraError::CompileIo {
            path: path.into(),
            source,
        }
    }

    /// Creates a `Config` error with a specific message.
    ///
    /// # Parameters
    /// - `message`: A description of the configuration error.
    /// - `path`: Optional path of the configuration file causing the error.
    pub fn config_error<S: Into<String>>(
        message: S,
        path: Option<PathBuf>,
    ) -> Self {
        TesseraError::Config {
            message: message.into(),
            path,
        }
    }

    /// Creates a `Template` error with a message, template name, and optional source.
    pub fn template_error<S: Into<String>>(
        message: S,
        template: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        TesseraError::Template {
            message: message.into(),
            template: template.into(),
            source,
        }
    }

    /// Creates a `Filter` error.
    ///
    /// User filters can return this to report a failure; the error reaches
    /// the caller of `Item::filter` untouched.
    pub fn filter_error<S: Into<String>>(
        message: S,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        TesseraError::Filter {
            message: message.into(),
            source,
        }
    }
}
