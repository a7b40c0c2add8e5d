// Copyright © 2024 Tessera. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Sites
//!
//! A [`Site`] owns every [`Item`] found under its content directory. It is
//! configured in bulk: [`Site::route`], [`Site::filter`] and
//! [`Site::template`] take a regular expression, match it against every key
//! from the start, and attach the given callable to each matching item.
//!
//! ```rust,no_run
//! use tessera::Site;
//!
//! let mut site = Site::new("site", "site/items")?;
//! site.route("(.*)", |caps, _| format!("{}/index.html", &caps[1]))?;
//! site.route("index", |_, _| "index.html".to_string())?;
//! # Ok::<(), tessera::TesseraError>(())
//! ```

use crate::core::config::KeyPolicy;
use crate::core::error::{Result, TesseraError};
use crate::item::{Item, TemplateFn};
use log::{debug, info};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use walkdir::WalkDir;

/// All items of a site, keyed by their path-derived key.
#[derive(Debug)]
pub struct Site {
    base_path: PathBuf,
    items_path: PathBuf,
    items: BTreeMap<String, Item>,
}

impl Site {
    /// Creates a site and scans `items_path` with the default key policy.
    ///
    /// # Errors
    ///
    /// Fails if the content tree cannot be walked or read, if a file holds
    /// malformed front matter, or if two files derive the same key.
    pub fn new(
        base_path: impl Into<PathBuf>,
        items_path: impl AsRef<Path>,
    ) -> Result<Self> {
        Self::with_key_policy(base_path, items_path, KeyPolicy::default())
    }

    /// Creates a site and scans `items_path`, deriving keys with `policy`.
    pub fn with_key_policy(
        base_path: impl Into<PathBuf>,
        items_path: impl AsRef<Path>,
        policy: KeyPolicy,
    ) -> Result<Self> {
        let items_path = items_path.as_ref();
        let items_path = fs::canonicalize(items_path)
            .map_err(|e| TesseraError::scan(items_path, e))?;

        let mut site = Self {
            base_path: base_path.into(),
            items_path,
            items: BTreeMap::new(),
        };
        site.scan(policy)?;
        Ok(site)
    }

    /// Walks the content directory and creates one item per regular file.
    fn scan(&mut self, policy: KeyPolicy) -> Result<()> {
        for entry in WalkDir::new(&self.items_path)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.items_path.clone());
                TesseraError::scan(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.items_path).unwrap_or(path);
            let key = derive_key(relative, policy)?;
            if self.items.contains_key(&key) {
                return Err(TesseraError::DuplicateKey {
                    key,
                    path: path.to_path_buf(),
                });
            }

            let raw = fs::read_to_string(path)
                .map_err(|e| TesseraError::scan(path, e))?;
            debug!("Scanned `{}` from {}", key, path.display());
            let item = Item::new(key.clone(), &raw, None)?;
            let _ = self.items.insert(key, item);
        }

        info!(
            "Scanned {} items from {}",
            self.items.len(),
            self.items_path.display()
        );
        Ok(())
    }

    /// The site's base directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// The (canonical) content directory.
    pub fn items_path(&self) -> &Path {
        &self.items_path
    }

    /// All items, ordered by key.
    pub fn items(&self) -> &BTreeMap<String, Item> {
        &self.items
    }

    /// Mutable iteration over all items, ordered by key.
    pub fn items_mut(
        &mut self,
    ) -> impl Iterator<Item = (&String, &mut Item)> + '_ {
        self.items.iter_mut()
    }

    /// Looks up an item by key.
    pub fn item(&self, key: &str) -> Option<&Item> {
        self.items.get(key)
    }

    /// Looks up an item by key for modification.
    pub fn item_mut(&mut self, key: &str) -> Option<&mut Item> {
        self.items.get_mut(key)
    }

    /// Number of items in the site.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the content directory held no files.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Matches `expression` against every key, anchored at the start.
    ///
    /// A key matches when the expression matches a prefix of it; add `$` to
    /// require the whole key. Pairs come back in key order.
    pub fn match_items(
        &self,
        expression: &str,
    ) -> Result<Vec<(Captures<'_>, &Item)>> {
        let matcher = compile_expression(expression)?;
        Ok(self
            .items
            .iter()
            .filter_map(|(key, item)| {
                matcher.captures(key).map(|captures| (captures, item))
            })
            .collect())
    }

    /// Sets the route of every matching item to `router(captures, item)`.
    ///
    /// Later calls overwrite routes set by earlier ones. Returns the number
    /// of matched items.
    pub fn route<F>(&mut self, expression: &str, router: F) -> Result<usize>
    where
        F: Fn(&Captures<'_>, &Item) -> String,
    {
        let matcher = compile_expression(expression)?;
        let mut matched = 0;
        for (key, item) in &mut self.items {
            if let Some(captures) = matcher.captures(key) {
                let route = router(&captures, &*item);
                if let Some(previous) = item.route() {
                    if previous != route {
                        debug!(
                            "Route of `{}` changed from `{}` to `{}`",
                            key, previous, route
                        );
                    }
                }
                item.set_route(route);
                matched += 1;
            }
        }
        debug!("Routed {} items matching `{}`", matched, expression);
        Ok(matched)
    }

    /// Appends `filter` to every matching item.
    ///
    /// Filters accumulate: an item matched by several calls runs each of
    /// them, in call order. Returns the number of matched items.
    pub fn filter<F>(&mut self, expression: &str, filter: F) -> Result<usize>
    where
        F: Fn(&mut Item) -> Result<()> + 'static,
    {
        let matcher = compile_expression(expression)?;
        let filter: Rc<dyn Fn(&mut Item) -> Result<()>> = Rc::new(filter);
        let mut matched = 0;
        for (key, item) in &mut self.items {
            if matcher.is_match(key) {
                item.add_filter(Rc::clone(&filter));
                matched += 1;
            }
        }
        debug!("Filtered {} items matching `{}`", matched, expression);
        Ok(matched)
    }

    /// Sets `templater` on every matching item, replacing earlier ones.
    ///
    /// Returns the number of matched items.
    pub fn template<F>(
        &mut self,
        expression: &str,
        templater: F,
    ) -> Result<usize>
    where
        F: Fn(&Item) -> Result<String> + 'static,
    {
        self.template_with(expression, Rc::new(templater))
    }

    /// Like [`Site::template`], for a templater that is already shared.
    pub fn template_with(
        &mut self,
        expression: &str,
        templater: TemplateFn,
    ) -> Result<usize> {
        let matcher = compile_expression(expression)?;
        let mut matched = 0;
        for (key, item) in &mut self.items {
            if matcher.is_match(key) {
                item.set_templater(Rc::clone(&templater));
                matched += 1;
            }
        }
        debug!("Templated {} items matching `{}`", matched, expression);
        Ok(matched)
    }
}

/// Compiles `expression` so that it only matches at the start of a key.
///
/// The expression is wrapped in a non-capturing group, so group numbers and
/// names are those of the original expression.
pub fn compile_expression(expression: &str) -> Result<Regex> {
    Regex::new(&format!(r"\A(?:{})", expression)).map_err(|source| {
        TesseraError::Pattern {
            expression: expression.to_string(),
            source,
        }
    })
}

/// Derives an item key from a path relative to the content directory.
///
/// Components are joined with `/` on every platform. With
/// [`KeyPolicy::StripExtension`] the last extension of the file name is
/// dropped.
pub fn derive_key(relative: &Path, policy: KeyPolicy) -> Result<String> {
    let stripped;
    let relative = match policy {
        KeyPolicy::KeepExtension => relative,
        KeyPolicy::StripExtension => {
            stripped = relative.with_extension("");
            stripped.as_path()
        }
    };

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part =
                    part.to_str().ok_or_else(|| TesseraError::InvalidKeyPath {
                        path: relative.to_path_buf(),
                    })?;
                parts.push(part);
            }
            Component::CurDir => {}
            _ => {
                return Err(TesseraError::InvalidKeyPath {
                    path: relative.to_path_buf(),
                })
            }
        }
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Lays out `items/index.html`, `items/test/test.html` and
    /// `items/test/test/test.html`.
    fn build_test_site() -> (TempDir, Site) {
        let temp_dir = TempDir::new().unwrap();
        let items = temp_dir.path().join("items");
        fs::create_dir_all(items.join("test/test")).unwrap();
        fs::write(items.join("index.html"), "Index").unwrap();
        fs::write(items.join("test/test.html"), "Test").unwrap();
        fs::write(
            items.join("test/test/test.html"),
            "---\n{\"title\": \"Deep\"}\n---\nDeep",
        )
        .unwrap();

        let site = Site::new(temp_dir.path(), &items).unwrap();
        (temp_dir, site)
    }

    #[test]
    fn test_scan() {
        let (_dir, site) = build_test_site();
        let keys: Vec<&str> = site.items().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["index", "test/test", "test/test/test"]);
        assert_eq!(site.item("test/test/test").unwrap().raw_content(), "Deep");
        assert_eq!(
            site.item("test/test/test").unwrap().metadata()["title"],
            "Deep"
        );
    }

    #[test]
    fn test_scan_keep_extension() {
        let (dir, _) = build_test_site();
        let site = Site::with_key_policy(
            dir.path(),
            dir.path().join("items"),
            KeyPolicy::KeepExtension,
        )
        .unwrap();
        assert!(site.item("index.html").is_some());
        assert!(site.item("test/test/test.html").is_some());
        assert_eq!(site.len(), 3);
    }

    #[test]
    fn test_scan_duplicate_keys() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("page.md"), "a").unwrap();
        fs::write(temp_dir.path().join("page.html"), "b").unwrap();

        let result = Site::new(temp_dir.path(), temp_dir.path());
        assert!(matches!(
            result,
            Err(TesseraError::DuplicateKey { ref key, .. }) if key == "page"
        ));
    }

    #[test]
    fn test_scan_rejects_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();

        let result = Site::new(temp_dir.path(), temp_dir.path());
        assert!(matches!(result, Err(TesseraError::Scan { .. })));
    }

    #[test]
    fn test_scan_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = Site::new(temp_dir.path(), temp_dir.path().join("nope"));
        assert!(matches!(result, Err(TesseraError::Scan { .. })));
    }

    #[test]
    fn test_scan_malformed_front_matter() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("bad.md"), "---\n{nope\n---\n").unwrap();

        let result = Site::new(temp_dir.path(), temp_dir.path());
        assert!(matches!(result, Err(TesseraError::MetadataParse { .. })));
    }

    #[test]
    fn test_match_items() {
        let (_dir, site) = build_test_site();
        let matches = site.match_items(r"(.*)").unwrap();
        assert_eq!(matches.len(), 3);
        for (captures, item) in &matches {
            assert_eq!(&captures[1], item.key());
            assert!(site.item(&captures[1]).is_some());
        }
    }

    #[test]
    fn test_match_is_anchored_at_start() {
        let (_dir, site) = build_test_site();
        let keys: Vec<&str> = site
            .match_items("test")
            .unwrap()
            .into_iter()
            .map(|(_, item)| item.key())
            .collect();
        assert_eq!(keys, vec!["test/test", "test/test/test"]);

        assert!(site.match_items("est").unwrap().is_empty());
        assert_eq!(site.match_items("test/test$").unwrap().len(), 1);
    }

    #[test]
    fn test_match_alternation_stays_anchored() {
        let (_dir, site) = build_test_site();
        let matches = site.match_items("nothing|index").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(site.match_items("x|test/test/test").unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_expression() {
        let (_dir, mut site) = build_test_site();
        let result = site.route("(", |_, _| "never".to_string());
        assert!(matches!(result, Err(TesseraError::Pattern { .. })));
        assert!(site.items().values().all(|item| item.route().is_none()));
    }

    #[test]
    fn test_route() {
        let (_dir, mut site) = build_test_site();

        let routed = site
            .route(r"(.*)", |captures, _| format!("{}/index.html", &captures[1]))
            .unwrap();
        assert_eq!(routed, 3);
        let _ = site.route(r"index", |_, _| "index.html".to_string()).unwrap();

        assert_eq!(site.item("index").unwrap().route(), Some("index.html"));
        assert_eq!(
            site.item("test/test").unwrap().route(),
            Some("test/test/index.html")
        );
    }

    #[test]
    fn test_route_sees_item() {
        let (_dir, mut site) = build_test_site();
        let _ = site
            .route("test/test/test", |_, item| {
                format!("{}.html", item.metadata()["title"].as_str().unwrap_or("untitled"))
            })
            .unwrap();
        assert_eq!(
            site.item("test/test/test").unwrap().route(),
            Some("Deep.html")
        );
    }

    #[test]
    fn test_filter() {
        let (_dir, mut site) = build_test_site();

        let _ = site.filter(r"(.*)", |_| Ok(())).unwrap();
        let _ = site.filter(r"index", |_| Ok(())).unwrap();

        assert_eq!(site.item("index").unwrap().filter_count(), 2);
        assert_eq!(site.item("test/test").unwrap().filter_count(), 1);
    }

    #[test]
    fn test_filter_shared_across_items() {
        let (_dir, mut site) = build_test_site();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let _ = site
            .filter(".*", move |_| {
                counter.set(counter.get() + 1);
                Ok(())
            })
            .unwrap();

        for (_, item) in site.items_mut() {
            let _ = item.content().unwrap();
            let _ = item.content().unwrap();
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_templater() {
        let (_dir, mut site) = build_test_site();

        let _ = site.template(r"(.*)", |_| Ok("ALL".to_string())).unwrap();
        let _ = site.template(r"index", |_| Ok("INDEX".to_string())).unwrap();

        assert_eq!(site.item_mut("index").unwrap().templated().unwrap(), "INDEX");
        assert_eq!(site.item_mut("test/test").unwrap().templated().unwrap(), "ALL");
    }

    #[test]
    fn test_template_with_shares_templater() {
        let (_temp_dir, mut site) = build_test_site();
        let templater: TemplateFn = Rc::new(|item: &Item| {
            Ok(format!("<main>{}</main>", item.filtered_content()))
        });

        let matched = site.template_with("test", Rc::clone(&templater)).unwrap();
        assert_eq!(matched, 2);
        assert_eq!(Rc::strong_count(&templater), 3);
        assert_eq!(
            site.item_mut("test/test").unwrap().templated().unwrap(),
            "<main>Test</main>"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_follows_symlinked_files() {
        let temp_dir = TempDir::new().unwrap();
        let items = temp_dir.path().join("items");
        fs::create_dir_all(&items).unwrap();
        fs::write(items.join("index.md"), "Index").unwrap();
        fs::write(temp_dir.path().join("shared.md"), "Shared").unwrap();
        std::os::unix::fs::symlink(
            temp_dir.path().join("shared.md"),
            items.join("about.md"),
        )
        .unwrap();

        let site = Site::new(temp_dir.path(), &items).unwrap();
        let keys: Vec<&String> = site.items().keys().collect();
        assert_eq!(keys, ["about", "index"]);
        assert_eq!(site.item("about").unwrap().raw_content(), "Shared");
    }

    #[test]
    fn test_derive_key() {
        assert_eq!(
            derive_key(Path::new("blog/post.md"), KeyPolicy::StripExtension).unwrap(),
            "blog/post"
        );
        assert_eq!(
            derive_key(Path::new("blog/post.md"), KeyPolicy::KeepExtension).unwrap(),
            "blog/post.md"
        );
        assert_eq!(
            derive_key(Path::new("archive.tar.gz"), KeyPolicy::StripExtension).unwrap(),
            "archive.tar"
        );
        assert_eq!(
            derive_key(Path::new(".htaccess"), KeyPolicy::StripExtension).unwrap(),
            ".htaccess"
        );
    }
}
