//! Engine-configuration loading.
//!
//! The external CSS engine's configuration file is consumed read-only and for
//! one purpose: its `content` field supplies the glob patterns the scanner
//! and watcher operate on. The loader normalizes every supported format to
//! [`EngineConfig`], so the pipeline never cares how the file was written.
//!
//! Supported formats:
//! - `.json` and `.toml`, deserialized with serde;
//! - `.js` / `.cjs` / `.mjs` (the Tailwind default), handled with a lenient
//!   lexical extraction of the `content` array. Because the extraction is
//!   lexical, it is indifferent to `module.exports = {...}` versus
//!   `export default {...}` wrappers.
//!
//! A missing file, an unparseable body, or a missing/wrong-typed `content`
//! field is a fatal [`ConfigError`]: without glob patterns no rule can ever
//! be produced. An explicitly empty `content` array is accepted; the scanner
//! warns and the run emits an empty document.

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Configuration errors, all fatal to the run that hits them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Config {path} has no usable `content` field (expected a glob pattern or an array of glob patterns)")]
    MissingContent { path: PathBuf },
}

/// The normalized engine configuration: the file-scan glob patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub content: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    content: Option<ContentField>,
}

/// `content` may be a single glob pattern or a sequence of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentField {
    One(String),
    Many(Vec<String>),
}

impl ContentField {
    fn into_patterns(self) -> Vec<String> {
        match self {
            ContentField::One(pattern) => vec![pattern],
            ContentField::Many(patterns) => patterns,
        }
    }
}

/// Loads and normalizes the engine configuration at `path`, dispatching on
/// the file extension.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let content = match extension.as_deref() {
        Some("json") => {
            let raw: RawConfig =
                serde_json::from_str(&text).map_err(|err| ConfigError::Parse {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                })?;
            raw.content.map(ContentField::into_patterns)
        }
        Some("toml") => {
            let raw: RawConfig = toml::from_str(&text).map_err(|err| ConfigError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
            raw.content.map(ContentField::into_patterns)
        }
        _ => extract_js_content(&text),
    };

    match content {
        Some(patterns) => Ok(EngineConfig { content: patterns }),
        None => Err(ConfigError::MissingContent {
            path: path.to_path_buf(),
        }),
    }
}

/// Lexically extracts the `content` value from JavaScript config text.
///
/// Finds a `content:` key at an identifier boundary, then reads either the
/// bracketed array that follows (collecting its string literals) or a single
/// quoted string. Returns `None` when no such key exists.
fn extract_js_content(text: &str) -> Option<Vec<String>> {
    let mut search_from = 0usize;

    while let Some(rel_idx) = text[search_from..].find("content") {
        let idx = search_from + rel_idx;
        search_from = idx + "content".len();

        if idx > 0 {
            let before = text[..idx].chars().next_back().unwrap();
            if before.is_alphanumeric() || before == '_' || before == '$' || before == '.' {
                continue;
            }
        }

        let rest = text[idx + "content".len()..].trim_start();
        let Some(value) = rest.strip_prefix(':') else {
            continue;
        };
        let value = value.trim_start();

        if value.starts_with('[') {
            let close = find_matching_bracket(value, 0)?;
            return Some(extract_string_literals(&value[1..close]));
        }
        if value.starts_with('"') || value.starts_with('\'') || value.starts_with('`') {
            let literals = extract_string_literals(value);
            return literals.into_iter().next().map(|first| vec![first]);
        }
        // `content` bound to something we cannot evaluate (a variable, a
        // spread, an object form); treat as missing.
        return None;
    }

    None
}

fn find_matching_bracket(text: &str, open_idx: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text[open_idx..].char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open_idx + idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn string_literal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""([^"\\]*)"|'([^'\\]*)'|`([^`\\]*)`"#).expect("literal pattern is valid")
    })
}

fn extract_string_literals(text: &str) -> Vec<String> {
    string_literal_pattern()
        .captures_iter(text)
        .filter_map(|captures| {
            captures
                .get(1)
                .or_else(|| captures.get(2))
                .or_else(|| captures.get(3))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}
