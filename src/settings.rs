//! Settings infrastructure for popedit.
//!
//! This module provides support for loading and parsing popedit.toml files
//! to configure the locator probe bound, blank-line handling, and the
//! comment skip pattern.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

/// File name looked up by [`discover_settings`].
pub const SETTINGS_FILE: &str = "popedit.toml";

/// Default pattern stripped after a comment-start token: whitespace and `*`.
pub const DEFAULT_COMMENT_SKIP_PATTERN: &str = r"[ \t*]*";

/// Default number of offsets probed on each side of the cursor by the
/// locator. Kept small and configurable rather than inferred.
pub const DEFAULT_PROBE_LIMIT: usize = 3;

/// What to emit for a whitespace-only line when decoration is restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankLinePolicy {
    /// Emit the prefix unchanged, trailing whitespace and all.
    #[default]
    None,
    /// Emit the prefix with trailing whitespace removed.
    Trim,
    /// Omit the prefix entirely and emit a bare empty line.
    Drop,
}

/// Root settings structure loaded from popedit.toml.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How many offsets the locator probes forward (after skipping
    /// whitespace) and then backward when the cursor is not directly
    /// inside a string or comment.
    pub probe_limit: usize,

    /// Blank-line handling on restoration.
    pub blank_line_policy: BlankLinePolicy,

    /// Regex fragment matched (anchored) after the comment-start token
    /// when computing a comment line's structural prefix.
    pub comment_skip_pattern: String,

    /// Reduce the suggested editing width by the prefix length.
    pub adjust_fill_width: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            probe_limit: DEFAULT_PROBE_LIMIT,
            blank_line_policy: BlankLinePolicy::default(),
            comment_skip_pattern: DEFAULT_COMMENT_SKIP_PATTERN.to_string(),
            adjust_fill_width: true,
        }
    }
}

impl Settings {
    /// Compile the comment skip pattern, anchored at the line position
    /// where it applies. An invalid pattern falls back to the default.
    pub fn skip_pattern(&self) -> Regex {
        Regex::new(&format!("^(?:{})", self.comment_skip_pattern)).unwrap_or_else(|_| {
            Regex::new(concat!("^(?:", r"[ \t*]*", ")")).expect("default skip pattern compiles")
        })
    }
}

/// Load settings from a popedit.toml file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!("failed to parse {}: {}", path.display(), err);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Walk up the directory tree from `start`, returning the first
/// popedit.toml found together with the directory containing it.
///
/// Falls back to default settings anchored at `start` when no file is
/// found anywhere up the tree.
pub fn discover_settings(start: &Path) -> (Settings, PathBuf) {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(SETTINGS_FILE);
        if candidate.is_file() {
            return (load_settings(&candidate), current.to_path_buf());
        }
        dir = current.parent();
    }
    (Settings::default(), start.to_path_buf())
}
