//! # Built-in Filters
//!
//! Filters that ship with Tessera and can be referenced by name from a
//! configuration file's `[[filter]]` rules. Each one implements
//! [`ContentFilter`]; [`builtin`] builds one from its name.
//!
//! ## Available Filters
//!
//! - `markdown` ([`MarkdownFilter`]): renders the content as CommonMark HTML
//! - `title` ([`TitleFilter`]): fills `metadata.title` from the first heading
//! - `minify` ([`MinifyFilter`]): minifies HTML content
//!
//! ## Usage
//!
//! Built-in filters plug into [`Site::filter`](crate::Site::filter) like any
//! closure:
//!
//! ```rust,no_run
//! use tessera::processors::{ContentFilter, MarkdownFilter};
//! use tessera::Site;
//!
//! let mut site = Site::new("site", "site/items")?;
//! let markdown = MarkdownFilter::new().with_tables(true);
//! site.filter("posts/", move |item| markdown.apply(item))?;
//! # Ok::<(), tessera::TesseraError>(())
//! ```

use crate::core::config::MarkdownConfig;
use crate::core::error::{Result, TesseraError};
use crate::item::Item;
use std::fmt::Debug;
use std::rc::Rc;

/// Markdown rendering and heading extraction.
pub mod markdown;

/// HTML minification.
pub mod minify;

// Re-export commonly used types
pub use markdown::{MarkdownFilter, TitleFilter};
pub use minify::MinifyFilter;

/// Names accepted by [`builtin`].
pub const BUILTIN_FILTERS: &[&str] = &["markdown", "title", "minify"];

/// A reusable filter operating on a single item.
pub trait ContentFilter: Debug {
    /// The name the filter is registered under.
    fn name(&self) -> &str;

    /// Transforms the item's metadata and/or filtered content in place.
    fn apply(&self, item: &mut Item) -> Result<()>;
}

/// Whether `name` refers to a built-in filter.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_FILTERS.contains(&name)
}

/// Creates the built-in filter called `name`.
pub fn builtin(
    name: &str,
    markdown: &MarkdownConfig,
) -> Result<Rc<dyn ContentFilter>> {
    match name {
        "markdown" => Ok(Rc::new(
            MarkdownFilter::new()
                .with_tables(markdown.tables)
                .with_footnotes(markdown.footnotes)
                .with_strikethrough(markdown.strikethrough),
        )),
        "title" => Ok(Rc::new(TitleFilter)),
        "minify" => Ok(Rc::new(MinifyFilter::new())),
        other => Err(TesseraError::filter_error(
            format!("Unknown filter '{}'", other),
            None,
        )),
    }
}
