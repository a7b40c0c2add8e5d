//! # Markdown Filters
//!
//! [`MarkdownFilter`] renders an item's filtered content from CommonMark to
//! HTML with `pulldown-cmark`. [`TitleFilter`] fills in a missing
//! `metadata.title` from the first level-one heading, so templates can rely
//! on a title even when the front matter omits one.
//!
//! ```rust
//! use tessera::processors::{ContentFilter, MarkdownFilter, TitleFilter};
//! use tessera::Item;
//!
//! let mut item = Item::new("post", "# Hello\n\nThis is **bold**.", None).unwrap();
//! TitleFilter.apply(&mut item).unwrap();
//! MarkdownFilter::new().apply(&mut item).unwrap();
//!
//! assert_eq!(item.metadata()["title"], "Hello");
//! assert!(item.filtered_content().contains("<strong>bold</strong>"));
//! ```

use crate::core::error::Result;
use crate::item::Item;
use crate::processors::ContentFilter;
use log::debug;
use pulldown_cmark::{
    html, Event, HeadingLevel, Options as MarkdownOptions, Parser, Tag,
    TagEnd,
};
use serde_json::Value as JsonValue;

/// Renders Markdown content to HTML.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownFilter {
    options: MarkdownOptions,
}

impl MarkdownFilter {
    /// Creates a new `MarkdownFilter` with plain CommonMark settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera::processors::MarkdownFilter;
    /// let filter = MarkdownFilter::new();
    /// ```
    pub fn new() -> Self {
        Self {
            options: MarkdownOptions::empty(),
        }
    }

    /// Enables or disables table support.
    pub fn with_tables(mut self, enable: bool) -> Self {
        self.options.set(MarkdownOptions::ENABLE_TABLES, enable);
        self
    }

    /// Enables or disables strikethrough support.
    pub fn with_strikethrough(mut self, enable: bool) -> Self {
        self.options.set(MarkdownOptions::ENABLE_STRIKETHROUGH, enable);
        self
    }

    /// Enables or disables footnote support.
    pub fn with_footnotes(mut self, enable: bool) -> Self {
        self.options.set(MarkdownOptions::ENABLE_FOOTNOTES, enable);
        self
    }

    /// Renders `content` to an HTML string.
    pub fn render(&self, content: &str) -> String {
        let parser = Parser::new_ext(content, self.options);
        let mut html_output = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }
}

impl Default for MarkdownFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentFilter for MarkdownFilter {
    fn name(&self) -> &str {
        "markdown"
    }

    fn apply(&self, item: &mut Item) -> Result<()> {
        debug!("Rendering markdown for `{}`", item.key());
        let rendered = self.render(item.filtered_content());
        item.set_filtered_content(rendered);
        Ok(())
    }
}

/// Sets `metadata.title` from the first `#` heading when it is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleFilter;

impl TitleFilter {
    /// Returns the text of the first level-one heading in `content`.
    pub fn first_heading(content: &str) -> Option<String> {
        let mut title = String::new();
        let mut in_heading = false;

        for event in Parser::new(content) {
            match event {
                Event::Start(Tag::Heading {
                    level: HeadingLevel::H1,
                    ..
                }) => in_heading = true,
                Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                    let title = title.trim();
                    return (!title.is_empty()).then(|| title.to_string());
                }
                Event::Text(text) | Event::Code(text) if in_heading => {
                    title.push_str(&text)
                }
                _ => {}
            }
        }

        None
    }
}

impl ContentFilter for TitleFilter {
    fn name(&self) -> &str {
        "title"
    }

    fn apply(&self, item: &mut Item) -> Result<()> {
        if item.metadata().contains_key("title") {
            return Ok(());
        }
        if let Some(title) = Self::first_heading(item.filtered_content()) {
            let _ = item
                .metadata_mut()
                .insert("title".to_string(), JsonValue::String(title));
        }
        Ok(())
    }
}
