//! Breakpoint-token extraction from project source files.
//!
//! The scanner enumerates files from glob patterns, reads each as UTF-8 text,
//! and collects every substring matching the breakpoint-token grammar:
//!
//! ```text
//! media-<max|min>-<pixels>:<utility-class>
//! ```
//!
//! where `<utility-class>` is a greedy run of characters from
//! `[A-Za-z0-9_\-/\[\].%]` (stopping at the first character outside that set,
//! such as a quote or whitespace). Tokens are deduplicated by their exact raw
//! text, first occurrence wins, and files are visited in sorted order so the
//! resulting set has a deterministic insertion order.
//!
//! Scanning is read-only and retains no state between calls. A file that
//! cannot be read is skipped with a warning; an empty pattern list yields an
//! empty set with a warning. Neither aborts the scan.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Whether a rule applies at-or-below (`Max`) or at-or-above (`Min`) the
/// breakpoint's pixel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Max,
    Min,
}

impl Direction {
    /// The media-feature name used in the emitted `@media` condition.
    pub fn media_feature(&self) -> &'static str {
        match self {
            Direction::Max => "max-width",
            Direction::Min => "min-width",
        }
    }
}

/// One extracted breakpoint token.
///
/// `raw` is the exact matched source text. It uniquely determines the parsed
/// components and serves as the dedup key and the stable identity of the
/// token through the rest of the pipeline (including the output selector).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointToken {
    pub direction: Direction,
    pub pixels: u32,
    pub utility_class: String,
    pub raw: String,
}

/// An insertion-ordered set of tokens keyed by raw token text.
///
/// First occurrence wins: inserting a raw token that was already seen is a
/// no-op, so a token discovered in a later file never overrides the entry
/// from an earlier file.
#[derive(Debug, Default)]
pub struct TokenSet {
    tokens: Vec<BreakpointToken>,
    seen: HashSet<String>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a token unless its raw text was already seen. Returns whether
    /// the token was added.
    pub fn insert(&mut self, token: BreakpointToken) -> bool {
        if self.seen.contains(&token.raw) {
            return false;
        }
        self.seen.insert(token.raw.clone());
        self.tokens.push(token);
        true
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BreakpointToken> {
        self.tokens.iter()
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.seen.contains(raw)
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"media-(max|min)-(\d+):([A-Za-z0-9_\-/\[\]\.%]+)")
            .expect("token grammar pattern is valid")
    })
}

/// Extracts every breakpoint token from one file's text, in match order.
///
/// Pure function of the input text; each call iterates the shared compiled
/// pattern from position zero, so no match-cursor state leaks between files.
pub fn extract_tokens(text: &str) -> Vec<BreakpointToken> {
    let mut tokens = Vec::new();

    for captures in token_pattern().captures_iter(text) {
        let raw = captures.get(0).expect("whole match").as_str();
        let direction = match &captures[1] {
            "max" => Direction::Max,
            _ => Direction::Min,
        };
        let pixels = match captures[2].parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                warn!(token = raw, "Breakpoint value out of range, skipping token");
                continue;
            }
        };

        tokens.push(BreakpointToken {
            direction,
            pixels,
            utility_class: captures[3].to_string(),
            raw: raw.to_string(),
        });
    }

    tokens
}

/// Scans all files matching the given glob patterns and returns the
/// deduplicated token set.
///
/// Patterns are resolved relative to the process working directory. An
/// invalid pattern is skipped with a warning rather than aborting the scan.
pub fn scan(patterns: &[String]) -> TokenSet {
    let mut set = TokenSet::new();

    if patterns.is_empty() {
        warn!("No content glob patterns configured, nothing to scan");
        return set;
    }

    let Some((globset, usable)) = build_globset(patterns) else {
        return set;
    };

    let files = enumerate_files(&usable, &globset);
    debug!(files = files.len(), "Scanning files for breakpoint tokens");

    for path in files {
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read file, skipping");
                continue;
            }
        };
        for token in extract_tokens(&text) {
            set.insert(token);
        }
    }

    set
}

/// Compiles the patterns into a matcher, dropping (with a warning) any
/// pattern that fails to parse. Returns the matcher plus the patterns that
/// survived, so file enumeration only walks roots of usable patterns.
fn build_globset(patterns: &[String]) -> Option<(GlobSet, Vec<String>)> {
    let mut builder = GlobSetBuilder::new();
    let mut usable = Vec::new();

    for pattern in patterns {
        // "./src/**/*.html" and "src/**/*.html" must match the same files;
        // walked paths are emitted without the "./" prefix.
        let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
                usable.push(pattern.to_string());
            }
            Err(err) => {
                warn!(pattern = %pattern, error = %err, "Invalid glob pattern, skipping");
            }
        }
    }

    if usable.is_empty() {
        warn!("No usable glob patterns, nothing to scan");
        return None;
    }

    builder.build().ok().map(|globset| (globset, usable))
}

/// Walks from each pattern's literal root and collects matching files, sorted
/// for a deterministic scan order. Hidden paths are never visited; gitignore
/// rules are not honored, the content globs alone decide what is scanned.
fn enumerate_files(patterns: &[String], globset: &GlobSet) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for root in walk_roots(patterns) {
        for entry in WalkBuilder::new(&root)
            .standard_filters(false)
            .hidden(true)
            .build()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    continue;
                }
            };
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.into_path();
            // WalkBuilder roots at "." prefix entries with "./", which would
            // defeat matching against relative patterns like "src/**/*.html".
            let normalized = match path.strip_prefix("./") {
                Ok(stripped) => stripped.to_path_buf(),
                Err(_) => path.clone(),
            };
            if !globset.is_match(&normalized) {
                continue;
            }
            if seen.insert(normalized.clone()) {
                files.push(normalized);
            }
        }
    }

    files.sort();
    files
}

/// Deduplicated literal path prefixes of the patterns, used as walk roots.
fn walk_roots(patterns: &[String]) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        let root = glob_root(pattern);
        if seen.insert(root.clone()) {
            roots.push(root);
        }
    }

    roots
}

/// The longest directory prefix of a glob pattern containing no meta
/// characters. `src/**/*.html` walks from `src/`; a bare `**/*.html` walks
/// from the working directory.
pub(crate) fn glob_root(pattern: &str) -> PathBuf {
    let meta_idx = pattern.find(|ch| matches!(ch, '*' | '?' | '[' | '{'));

    let Some(idx) = meta_idx else {
        let path = Path::new(pattern);
        if path.is_dir() {
            return path.to_path_buf();
        }
        return path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
    };

    match pattern[..idx].rfind('/') {
        Some(sep) if sep > 0 => PathBuf::from(&pattern[..sep]),
        Some(_) | None => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_single_token() {
        let tokens = extract_tokens(r#"<div class="media-max-768:hidden">"#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].direction, Direction::Max);
        assert_eq!(tokens[0].pixels, 768);
        assert_eq!(tokens[0].utility_class, "hidden");
        assert_eq!(tokens[0].raw, "media-max-768:hidden");
    }

    #[test]
    fn test_extract_min_direction() {
        let tokens = extract_tokens("media-min-1024:flex");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].direction, Direction::Min);
        assert_eq!(tokens[0].pixels, 1024);
        assert_eq!(tokens[0].utility_class, "flex");
    }

    #[test]
    fn test_extract_extended_class_charset() {
        let tokens = extract_tokens(r#"class="media-max-640:w-[50.5%] media-min-768:top-1/2""#);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].utility_class, "w-[50.5%]");
        assert_eq!(tokens[1].utility_class, "top-1/2");
    }

    #[test]
    fn test_extract_stops_at_quote_and_whitespace() {
        let tokens = extract_tokens(r#""media-max-768:hidden" media-min-500:flex x"#);
        assert_eq!(tokens[0].raw, "media-max-768:hidden");
        assert_eq!(tokens[1].raw, "media-min-500:flex");
    }

    #[test]
    fn test_extract_ignores_non_matching_text() {
        assert!(extract_tokens("media-768:hidden").is_empty());
        assert!(extract_tokens("media-max-:hidden").is_empty());
        assert!(extract_tokens("max-768:hidden").is_empty());
        assert!(extract_tokens("plain text with no tokens").is_empty());
    }

    #[test]
    fn test_extract_is_stateless_across_calls() {
        // Same text twice must produce identical matches; the shared compiled
        // pattern carries no cursor between calls.
        let text = "media-max-768:hidden media-min-1024:flex";
        let first = extract_tokens(text);
        let second = extract_tokens(text);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_extract_overflowing_pixels_skipped() {
        let tokens = extract_tokens("media-max-99999999999999999999:hidden media-max-768:flex");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].pixels, 768);
    }

    #[test]
    fn test_token_set_first_wins() {
        let mut set = TokenSet::new();
        let first = BreakpointToken {
            direction: Direction::Max,
            pixels: 768,
            utility_class: "hidden".to_string(),
            raw: "media-max-768:hidden".to_string(),
        };
        let duplicate = first.clone();

        assert!(set.insert(first));
        assert!(!set.insert(duplicate));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_token_set_preserves_insertion_order() {
        let mut set = TokenSet::new();
        for raw in ["media-max-768:hidden", "media-min-1024:flex", "media-max-640:block"] {
            for token in extract_tokens(raw) {
                set.insert(token);
            }
        }
        let raws: Vec<&str> = set.iter().map(|t| t.raw.as_str()).collect();
        assert_eq!(
            raws,
            vec!["media-max-768:hidden", "media-min-1024:flex", "media-max-640:block"]
        );
    }

    #[test]
    fn test_scan_dedups_across_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.html"),
            r#"<div class="media-max-768:hidden media-min-1024:flex">"#,
        )
        .unwrap();
        fs::write(dir.path().join("b.html"), r#"<div class="media-max-768:hidden">"#).unwrap();

        let pattern = format!("{}/*.html", dir.path().display());
        let set = scan(&[pattern]);

        assert_eq!(set.len(), 2);
        assert!(set.contains("media-max-768:hidden"));
        assert!(set.contains("media-min-1024:flex"));
    }

    #[test]
    fn test_scan_skips_unreadable_file() {
        let dir = TempDir::new().unwrap();
        // Invalid UTF-8 cannot be read as text and must not abort the scan.
        fs::write(dir.path().join("bad.html"), [0xff, 0xfe, 0x80]).unwrap();
        fs::write(dir.path().join("good.html"), "media-max-768:hidden").unwrap();

        let pattern = format!("{}/*.html", dir.path().display());
        let set = scan(&[pattern]);

        assert_eq!(set.len(), 1);
        assert!(set.contains("media-max-768:hidden"));
    }

    #[test]
    fn test_scan_empty_patterns() {
        let set = scan(&[]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_scan_invalid_pattern_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.html"), "media-max-768:hidden").unwrap();

        let good = format!("{}/*.html", dir.path().display());
        let set = scan(&["{unclosed".to_string(), good]);

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_scan_excludes_directories_and_non_matches() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("media-max-768:hidden")).ok();
        fs::write(dir.path().join("a.txt"), "media-max-768:hidden").unwrap();

        let pattern = format!("{}/*.html", dir.path().display());
        let set = scan(&[pattern]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_scan_reaches_ignore_listed_files() {
        let dir = TempDir::new().unwrap();
        // An ignore file must not override the content globs: generated
        // pages the config names explicitly still get scanned.
        fs::write(dir.path().join(".ignore"), "dist/\n").unwrap();
        fs::create_dir(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join("dist/page.html"), "media-max-768:hidden").unwrap();

        let pattern = format!("{}/**/*.html", dir.path().display());
        let set = scan(&[pattern]);

        assert!(set.contains("media-max-768:hidden"));
    }

    #[test]
    fn test_glob_root() {
        assert_eq!(glob_root("src/**/*.html"), PathBuf::from("src"));
        assert_eq!(glob_root("**/*.html"), PathBuf::from("."));
        assert_eq!(glob_root("a/b/c*.html"), PathBuf::from("a/b"));
        assert_eq!(glob_root("index.html"), PathBuf::from("."));
    }
}
