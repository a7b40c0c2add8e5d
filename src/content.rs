//! # Front Matter Module
//!
//! Splits a content file into its JSON front-matter block and its body.
//!
//! A front-matter block starts on the first line with a `---` delimiter and
//! ends at the next line that is exactly `---`:
//!
//! ```text
//! ---
//! {"title": "Hello"}
//! ---
//! Body text.
//! ```
//!
//! The split is done in two phases: locate the opening and closing delimiter
//! lines, then hand the block in between to `serde_json`. Content without a
//! complete block is returned untouched with empty metadata.

use crate::core::error::{Result, TesseraError};
use serde_json::{Map, Value as JsonValue};

/// Metadata attached to an item: the decoded front-matter object.
pub type Metadata = Map<String, JsonValue>;

/// The delimiter line that opens and closes a front-matter block.
pub const DELIMITER: &str = "---";

/// Result of splitting a content file.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    /// Decoded metadata; empty when the content has no front matter.
    pub metadata: Metadata,
    /// The body following the block, or the whole content if there is none.
    pub body: String,
}

/// Locates the front-matter block, returning `(block, body)` slices.
///
/// Returns `None` when the content does not open with a delimiter line,
/// never closes the block, or the block is blank.
pub fn split(content: &str) -> Option<(&str, &str)> {
    let (first, mut rest) = next_line(content)?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let block_start = content.len() - rest.len();
    while let Some((line, remaining)) = next_line(rest) {
        if line.trim_end() == DELIMITER {
            let block_end = content.len() - rest.len();
            let block = &content[block_start..block_end];
            if block.trim().is_empty() {
                return None;
            }
            return Some((block, remaining.trim_start()));
        }
        rest = remaining;
    }

    None
}

/// Parses the front matter of `content`.
///
/// `key` only labels the error when the block is not a JSON object.
pub fn parse(key: &str, content: &str) -> Result<FrontMatter> {
    match split(content) {
        Some((block, body)) => {
            let metadata =
                serde_json::from_str::<Metadata>(block).map_err(|source| {
                    TesseraError::MetadataParse {
                        key: key.to_string(),
                        source,
                    }
                })?;
            Ok(FrontMatter {
                metadata,
                body: body.to_string(),
            })
        }
        None => Ok(FrontMatter {
            metadata: Metadata::new(),
            body: content.to_string(),
        }),
    }
}

/// Returns the next line (without its terminator) and the text after it.
fn next_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    match text.find('\n') {
        Some(end) => {
            let line = &text[..end];
            Some((line.strip_suffix('\r').unwrap_or(line), &text[end + 1..]))
        }
        None => Some((text, "")),
    }
}
