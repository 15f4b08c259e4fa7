//! Boundary adapter over the external utility-CSS engine.
//!
//! breakwind never knows what `hidden` or `flex` expand to; it hands each
//! token's utility-class suffix to a [`UtilityEngine`] and gets back the
//! declaration block, or nothing when the engine cannot resolve the class.
//! An unresolvable class is expected, recoverable, per-token behavior: the
//! token is omitted from the output with a warning and the run continues.

use crate::scanner::{BreakpointToken, TokenSet};
use railwind::{parse_to_string, CollectionOptions, Source};
use tracing::warn;

/// A token paired with the engine's answer for its utility class.
/// `declarations` is `None` when the engine produced nothing for the class.
#[derive(Debug, Clone)]
pub struct ResolvedRule {
    pub token: BreakpointToken,
    pub declarations: Option<String>,
}

/// The narrow contract this pipeline needs from a utility-CSS engine:
/// one class name in, one declaration block (or nothing) out.
pub trait UtilityEngine {
    /// Returns the declaration block for a single utility class, for example
    /// `display: none;` for `hidden`, or `None` when the class is unknown.
    fn resolve(&self, utility_class: &str) -> Option<String>;
}

/// Production engine backed by the `railwind` crate.
///
/// The engine is asked to process a synthetic one-class source; the selector
/// it generates is discarded and only the first rule's declaration body is
/// kept, since the assembler builds its own selectors from raw token text.
#[derive(Debug, Default, Clone, Copy)]
pub struct RailwindEngine;

impl RailwindEngine {
    pub fn new() -> Self {
        Self
    }
}

impl UtilityEngine for RailwindEngine {
    fn resolve(&self, utility_class: &str) -> Option<String> {
        let mut warnings = Vec::new();
        let css = parse_to_string(
            Source::String(utility_class.to_string(), CollectionOptions::String),
            false,
            &mut warnings,
        );

        extract_declarations(&css)
    }
}

/// Pulls the declaration body out of the first rule of generated CSS,
/// normalized to one `property: value;` per line.
fn extract_declarations(css: &str) -> Option<String> {
    let open = css.find('{')?;
    let close = find_matching_brace(css, open)?;

    let body: Vec<String> = css[open + 1..close]
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .map(|decl| format!("{};", decl))
        .collect();

    if body.is_empty() {
        return None;
    }
    Some(body.join("\n"))
}

fn find_matching_brace(text: &str, open_idx: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text[open_idx..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
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

/// Resolves every token in the set, in insertion order.
///
/// Resolution gaps are logged per token and carried through as
/// `declarations: None` so the assembler can skip them; they never abort the
/// run.
pub fn resolve_all<E: UtilityEngine>(engine: &E, tokens: &TokenSet) -> Vec<ResolvedRule> {
    let mut resolved = Vec::with_capacity(tokens.len());

    for token in tokens.iter() {
        let declarations = engine.resolve(&token.utility_class);
        if declarations.is_none() {
            warn!(
                class = %token.utility_class,
                token = %token.raw,
                "Utility class could not be resolved, omitting rule"
            );
        }
        resolved.push(ResolvedRule {
            token: token.clone(),
            declarations,
        });
    }

    resolved
}
