//! HTML minification for templated or filtered output.

use crate::core::error::{Result, TesseraError};
use crate::item::Item;
use crate::processors::ContentFilter;
use minify_html::{minify, Cfg};

/// Minifies an item's filtered content with `minify-html`.
#[derive(Debug, Clone, Copy)]
pub struct MinifyFilter {
    minify_css: bool,
    minify_js: bool,
}

impl MinifyFilter {
    /// Creates a filter that also minifies inline CSS and JavaScript.
    pub fn new() -> Self {
        Self {
            minify_css: true,
            minify_js: true,
        }
    }

    /// Enables or disables minification of `<style>` contents.
    pub fn with_css(mut self, enable: bool) -> Self {
        self.minify_css = enable;
        self
    }

    /// Enables or disables minification of `<script>` contents.
    pub fn with_js(mut self, enable: bool) -> Self {
        self.minify_js = enable;
        self
    }

    /// Minifies an HTML string.
    pub fn minify_html(&self, content: &str) -> Result<String> {
        let cfg = Cfg {
            minify_css: self.minify_css,
            minify_js: self.minify_js,
            ..Cfg::default()
        };
        String::from_utf8(minify(content.as_bytes(), &cfg)).map_err(|e| {
            TesseraError::filter_error(
                "HTML minification failed",
                Some(Box::new(e)),
            )
        })
    }
}

impl Default for MinifyFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentFilter for MinifyFilter {
    fn name(&self) -> &str {
        "minify"
    }

    fn apply(&self, item: &mut Item) -> Result<()> {
        let minified = self.minify_html(item.filtered_content())?;
        item.set_filtered_content(minified);
        Ok(())
    }
}
