//! Optional per-class property filter for class rendering.
//!
//! Loaded from a plain-text file, one class per line:
//!
//! ```text
//! ; lines starting with ';' are comments
//! Point x,y,z
//! Line  start, end
//! ```
//!
//! First token is the class name; the remaining comma/space-separated
//! tokens are the field names allowed to render. A class not listed
//! renders all of its fields. Any failure to read the file is swallowed
//! and the filter treated as absent: filtering is a cosmetic enhancement,
//! never fatal.

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use tracing::warn;

/// Class name → allowed field names. Read-only after load; safe to share
/// across mirror instances.
#[derive(Debug, Default, Clone)]
pub struct PropertyFilter {
    classes: FxHashMap<String, FxHashSet<String>>,
}

impl PropertyFilter {
    /// Load from a file. `None` on any IO failure (file treated as absent).
    pub fn load(path: &Path) -> Option<PropertyFilter> {
        match std::fs::read_to_string(path) {
            Ok(text) => Some(Self::parse(&text)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "property filter unreadable, ignoring");
                None
            }
        }
    }

    /// Parse filter text. Unparseable lines are skipped, never fatal.
    pub fn parse(text: &str) -> PropertyFilter {
        let mut classes: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let class = match tokens.next() {
                Some(c) => c,
                None => continue,
            };
            let fields: FxHashSet<String> = tokens
                .flat_map(|t| t.split(','))
                .filter(|f| !f.is_empty())
                .map(|f| f.to_string())
                .collect();
            if fields.is_empty() {
                // class with no fields listed carries no information
                continue;
            }
            classes.entry(class.to_string()).or_default().extend(fields);
        }
        PropertyFilter { classes }
    }

    /// Whether this filter restricts the given class at all.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Whether a field of a class may render. Unlisted classes render
    /// everything.
    pub fn allows(&self, class: &str, field: &str) -> bool {
        match self.classes.get(class) {
            Some(fields) => fields.contains(field),
            None => true,
        }
    }
}
