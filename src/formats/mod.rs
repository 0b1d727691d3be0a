//! Per-format parse and compile plumbing.
//!
//! Every format module exposes the same surface: a `parse` that normalizes
//! file content into a [`StringSet`] (plus a hash-keyed template for source
//! files), an escape function, a builder policy for compilation modes, and
//! the compile hooks the format needs (plural block rewriting, post-compile
//! comment-out of marked source strings).

pub mod joomla;
pub mod po;
pub mod properties;
pub mod qt;
pub mod strings;

use std::collections::BTreeMap;

use crate::collections::StringSet;

/// Result of parsing one file.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// The translatable units found in the file.
    pub stringset: StringSet,
    /// Units that only qualify as suggestions (fuzzy/unfinished entries).
    pub suggestions: StringSet,
    /// Hash-keyed template; generated for source files only.
    pub template: Option<String>,
    /// Non-fatal messages keyed by topic, surfaced to the uploader.
    pub warnings: BTreeMap<String, String>,
}

/// Line separator used by the file, so templates round-trip byte-exact.
pub(crate) fn detect_linesep(content: &str) -> &'static str {
    if content.contains("\r\n") { "\r\n" } else { "\n" }
}
