// Copyright © 2024 Tessera. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Items
//!
//! An [`Item`] is one content file: its front-matter metadata, its body, the
//! filters and templater attached to it, and the route it will be written to.
//!
//! Content is evaluated lazily. Filters run the first time [`Item::content`]
//! or [`Item::templated`] is requested and never again; the templater runs on
//! every call to [`Item::templated`].

use crate::content::{self, Metadata};
use crate::core::error::Result;
use std::fmt;
use std::rc::Rc;

/// A filter: mutates an item's metadata and/or filtered content in place.
pub type FilterFn = Rc<dyn Fn(&mut Item) -> Result<()>>;

/// A templater: produces an item's final output from its filtered state.
pub type TemplateFn = Rc<dyn Fn(&Item) -> Result<String>>;

/// Suffix collapsed by [`Item::pretty_route`].
const INDEX_SUFFIX: &str = "/index.html";

/// A single content unit of a site.
pub struct Item {
    key: String,
    raw_content: String,
    metadata: Metadata,
    route: Option<String>,
    filters: Vec<FilterFn>,
    filtered: bool,
    filtered_content: String,
    templater: Option<TemplateFn>,
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("key", &self.key)
            .field("route", &self.route)
            .field("metadata", &self.metadata)
            .field("filters", &self.filters.len())
            .field("filtered", &self.filtered)
            .field("templater", &self.templater.is_some())
            .finish()
    }
}

impl Item {
    /// Creates an item from raw file content, extracting any front matter.
    ///
    /// # Errors
    ///
    /// Returns `TesseraError::MetadataParse` when a front-matter block is
    /// present but does not hold a JSON object.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera::Item;
    ///
    /// let item = Item::new("about", "---\n{\"title\": \"About\"}\n---\nHi.", None).unwrap();
    /// assert_eq!(item.metadata()["title"], "About");
    /// assert_eq!(item.raw_content(), "Hi.");
    /// ```
    pub fn new(
        key: impl Into<String>,
        raw: &str,
        route: Option<String>,
    ) -> Result<Self> {
        let key = key.into();
        let front_matter = content::parse(&key, raw)?;

        Ok(Self {
            key,
            filtered_content: front_matter.body.clone(),
            raw_content: front_matter.body,
            metadata: front_matter.metadata,
            route,
            filters: Vec::new(),
            filtered: false,
            templater: None,
        })
    }

    /// The item's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The content as read from disk, without its front-matter block.
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    /// Front-matter metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Mutable access to the metadata, for filters.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// The working copy of the content, as left by the filters run so far.
    ///
    /// Unlike [`Item::content`] this never triggers filtering, which makes it
    /// the accessor to use from inside filters and templaters.
    pub fn filtered_content(&self) -> &str {
        &self.filtered_content
    }

    /// Replaces the working copy of the content.
    pub fn set_filtered_content(&mut self, content: impl Into<String>) {
        self.filtered_content = content.into();
    }

    /// The output route, relative to the output directory.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Assigns the output route, replacing any previous one.
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.route = Some(route.into());
    }

    /// The route with a trailing `/index.html` collapsed to `/`.
    ///
    /// Returns `None` while no route is assigned.
    ///
    /// ```
    /// use tessera::Item;
    ///
    /// let item = Item::new("blog", "", Some("blog/index.html".into())).unwrap();
    /// assert_eq!(item.pretty_route().as_deref(), Some("blog/"));
    /// ```
    pub fn pretty_route(&self) -> Option<String> {
        self.route.as_deref().map(|route| {
            match route.strip_suffix(INDEX_SUFFIX) {
                Some(prefix) => format!("{}/", prefix),
                None => route.to_string(),
            }
        })
    }

    /// Appends a filter; filters run in the order they were added.
    pub fn add_filter(&mut self, filter: FilterFn) {
        self.filters.push(filter);
    }

    /// Number of filters attached to the item.
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Whether the filters have already run.
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// Sets the templater, replacing any previous one.
    pub fn set_templater(&mut self, templater: TemplateFn) {
        self.templater = Some(templater);
    }

    /// Whether a templater is assigned.
    pub fn has_templater(&self) -> bool {
        self.templater.is_some()
    }

    /// Runs every filter once, in order. Later calls do nothing.
    ///
    /// A failing filter stops the pass and its error is returned as is; the
    /// item is then still unfiltered, so a retry runs every filter again.
    pub fn filter(&mut self) -> Result<&mut Self> {
        if !self.filtered {
            // Filters added while running join the same pass.
            let mut index = 0;
            while let Some(filter) = self.filters.get(index).cloned() {
                filter(self)?;
                index += 1;
            }
            self.filtered = true;
        }
        Ok(self)
    }

    /// The filtered content, filtering first if needed.
    pub fn content(&mut self) -> Result<&str> {
        Ok(self.filter()?.filtered_content.as_str())
    }

    /// The final output of the item.
    ///
    /// Filters first if needed, then calls the templater. Without a
    /// templater this is the filtered content. The templater is called on
    /// every invocation; its output is not cached.
    pub fn templated(&mut self) -> Result<String> {
        let _ = self.filter()?;
        match self.templater.clone() {
            Some(templater) => templater(&*self),
            None => Ok(self.filtered_content.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::TesseraError;
    use serde_json::json;
    use std::cell::Cell;

    const TEST_ITEM: &str = "---\n{\n    \"name\": \"Test\",\n    \"list\": [1, 2, 3]\n}\n---\n\nHello, world! This is the actual content.";

    fn item() -> Item {
        Item::new("test", TEST_ITEM, None).unwrap()
    }

    #[test]
    fn test_content_matcher() {
        let item = item();
        assert_eq!(item.metadata()["name"], json!("Test"));
        assert_eq!(item.metadata()["list"], json!([1, 2, 3]));
        assert_eq!(
            item.raw_content(),
            "Hello, world! This is the actual content."
        );
        assert_eq!(item.filtered_content(), item.raw_content());
    }

    #[test]
    fn test_no_front_matter() {
        let item = Item::new("plain", "Just text.\n", None).unwrap();
        assert!(item.metadata().is_empty());
        assert_eq!(item.raw_content(), "Just text.\n");
    }

    #[test]
    fn test_malformed_front_matter() {
        let result = Item::new("bad", "---\n{oops}\n---\nbody", None);
        assert!(matches!(result, Err(TesseraError::MetadataParse { .. })));
    }

    #[test]
    fn test_filter_not_twice() -> Result<()> {
        let mut item = item();
        item.add_filter(Rc::new(|item: &mut Item| {
            let counter = item
                .metadata()
                .get("counter")
                .and_then(|value| value.as_i64())
                .unwrap_or(0);
            let _ = item
                .metadata_mut()
                .insert("counter".to_string(), json!(counter + 1));
            Ok(())
        }));

        let _ = item.filter()?;
        let _ = item.filter()?;
        let _ = item.content()?;

        assert_eq!(item.metadata()["counter"], json!(1));
        Ok(())
    }

    #[test]
    fn test_filter_without_filters_marks_filtered() -> Result<()> {
        let mut item = item();
        assert!(!item.is_filtered());
        assert!(item.filter()?.is_filtered());
        Ok(())
    }

    #[test]
    fn test_filters_run_in_order() -> Result<()> {
        let mut item = Item::new("order", "a", None)?;
        for suffix in ["b", "c"] {
            item.add_filter(Rc::new(move |item: &mut Item| {
                let next = format!("{}{}", item.filtered_content(), suffix);
                item.set_filtered_content(next);
                Ok(())
            }));
        }
        assert_eq!(item.content()?, "abc");
        assert_eq!(item.raw_content(), "a");
        Ok(())
    }

    #[test]
    fn test_failing_filter_propagates_and_leaves_item_unfiltered() {
        let mut item = item();
        item.add_filter(Rc::new(|_: &mut Item| {
            Err(TesseraError::filter_error("nope", None))
        }));

        let err = item.content().unwrap_err();
        assert!(matches!(err, TesseraError::Filter { ref message, .. } if message == "nope"));
        assert!(!item.is_filtered());
        assert_eq!(item.filter_count(), 1);
    }

    #[test]
    fn test_filter_added_by_filter_runs_in_same_pass() -> Result<()> {
        let ran = Rc::new(Cell::new(0));
        let counter = Rc::clone(&ran);
        let mut item = item();
        item.add_filter(Rc::new(move |item: &mut Item| {
            let counter = Rc::clone(&counter);
            item.add_filter(Rc::new(move |_: &mut Item| {
                counter.set(counter.get() + 1);
                Ok(())
            }));
            Ok(())
        }));

        let _ = item.content()?;
        let _ = item.content()?;

        assert_eq!(item.filter_count(), 2);
        assert_eq!(ran.get(), 1);
        Ok(())
    }

    #[test]
    fn test_content_property() -> Result<()> {
        let mut item = item();
        item.add_filter(Rc::new(|item: &mut Item| {
            item.set_filtered_content("Unit Testing!");
            Ok(())
        }));
        assert_eq!(item.content()?, "Unit Testing!");
        Ok(())
    }

    #[test]
    fn test_templated_without_templater_is_content() -> Result<()> {
        let mut item = item();
        item.add_filter(Rc::new(|item: &mut Item| {
            item.set_filtered_content("filtered");
            Ok(())
        }));
        assert_eq!(item.templated()?, "filtered");
        Ok(())
    }

    #[test]
    fn test_templater_property() -> Result<()> {
        let mut item = item();
        item.set_templater(Rc::new(|_: &Item| {
            Ok("Hello, test_templater_property!".to_string())
        }));
        assert_eq!(item.templated()?, "Hello, test_templater_property!");
        Ok(())
    }

    #[test]
    fn test_templater_runs_on_every_access() -> Result<()> {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut item = item();
        item.set_templater(Rc::new(move |item: &Item| {
            counter.set(counter.get() + 1);
            Ok(format!("<p>{}</p>", item.filtered_content()))
        }));

        let first = item.templated()?;
        let second = item.templated()?;

        assert_eq!(first, second);
        assert_eq!(calls.get(), 2);
        Ok(())
    }

    #[test]
    fn test_templater_sees_filtered_content() -> Result<()> {
        let mut item = Item::new("wrap", "body", None)?;
        item.add_filter(Rc::new(|item: &mut Item| {
            let upper = item.filtered_content().to_uppercase();
            item.set_filtered_content(upper);
            Ok(())
        }));
        item.set_templater(Rc::new(|item: &Item| {
            Ok(format!("[{}]", item.filtered_content()))
        }));
        assert_eq!(item.templated()?, "[BODY]");
        Ok(())
    }

    #[test]
    fn test_pretty_route() {
        let mut item = item();
        assert_eq!(item.pretty_route(), None);

        item.set_route("test/index.html");
        assert_eq!(item.pretty_route().as_deref(), Some("test/"));

        item.set_route("index.html");
        assert_eq!(item.pretty_route().as_deref(), Some("index.html"));

        item.set_route("feed.xml");
        assert_eq!(item.pretty_route().as_deref(), Some("feed.xml"));
    }
}
