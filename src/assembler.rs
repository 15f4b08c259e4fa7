//! Deterministic assembly of resolved rules into media-query blocks.
//!
//! Rules are grouped by breakpoint key `(direction, pixels)`. Groups are
//! emitted in the order their key is first encountered while iterating
//! resolved rules in scan order, and rules within a group keep scan order;
//! re-running on unchanged input therefore produces byte-identical output.

use crate::resolver::ResolvedRule;
use crate::scanner::Direction;

/// All resolved rules sharing one `(direction, pixels)` breakpoint key.
#[derive(Debug)]
pub struct BreakpointGroup<'a> {
    pub direction: Direction,
    pub pixels: u32,
    pub rules: Vec<&'a ResolvedRule>,
}

/// Renders the full output document body: one media-query block per
/// breakpoint key, containing one rule per distinct token.
///
/// Entries whose declarations are absent (unresolvable utility classes) are
/// filtered out first; a fully-unresolvable input yields an empty, still
/// valid document.
pub fn assemble(resolved: &[ResolvedRule]) -> String {
    let groups = group_by_breakpoint(resolved);

    let blocks: Vec<String> = groups.iter().map(render_group).collect();
    let mut document = blocks.join("\n\n");
    if !document.is_empty() {
        document.push('\n');
    }
    document
}

/// Groups rules with resolvable declarations by breakpoint key, preserving
/// first-encounter order of keys and scan order within each group.
fn group_by_breakpoint(resolved: &[ResolvedRule]) -> Vec<BreakpointGroup<'_>> {
    let mut groups: Vec<BreakpointGroup<'_>> = Vec::new();

    for rule in resolved {
        if rule.declarations.is_none() {
            continue;
        }
        let key = (rule.token.direction, rule.token.pixels);
        match groups.iter_mut().find(|g| (g.direction, g.pixels) == key) {
            Some(group) => group.rules.push(rule),
            None => groups.push(BreakpointGroup {
                direction: rule.token.direction,
                pixels: rule.token.pixels,
                rules: vec![rule],
            }),
        }
    }

    groups
}

fn render_group(group: &BreakpointGroup<'_>) -> String {
    let mut block = format!(
        "@media ({}: {}px) {{\n",
        group.direction.media_feature(),
        group.pixels
    );

    for (idx, rule) in group.rules.iter().enumerate() {
        if idx > 0 {
            block.push('\n');
        }
        let declarations = rule
            .declarations
            .as_deref()
            .expect("grouped rules have declarations");
        block.push_str(&format!("  .{} {{\n", escape_selector(&rule.token.raw)));
        for line in declarations.lines() {
            block.push_str(&format!("    {}\n", line.trim()));
        }
        block.push_str("  }\n");
    }

    block.push('}');
    block
}

/// Escapes a raw token for use as a CSS class selector. The token grammar
/// admits `:`, `[`, `]`, `.`, `/`, and `%`, all of which need a backslash in
/// selector position; identifier characters pass through.
pub fn escape_selector(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            escaped.push(ch);
        } else {
            escaped.push('\\');
            escaped.push(ch);
        }
    }
    escaped
}
