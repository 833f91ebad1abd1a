//! Rendering a tag index document.
//!
//! Layout (byte-exact, relied on for idempotent re-rendering):
//!
//! ```text
//! #<Tag>\n\n
//! \n\n##<A>\n\n<entry>\n\n<entry>\n\n
//! \n\n##<B>\n\n<entry>\n\n
//! ```

use super::entry::{IndexEntry, list_items, parse_line};

/// Parse every list line of an index document, degrading malformed lines.
#[must_use]
pub fn parse_index(text: &str) -> Vec<IndexEntry> {
    list_items(text)
        .map(|line| parse_line(line).into_entry())
        .collect()
}

/// Order entries, collapse duplicates, and keep one representative per key.
///
/// The sort is stable, so among entries sharing a `sort_key` the one seen
/// first in `entries` survives and its casing is what gets rendered.
#[must_use]
pub fn collapse_entries(mut entries: Vec<IndexEntry>) -> Vec<IndexEntry> {
    entries.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

    let mut representatives: Vec<IndexEntry> = group_runs(entries)
        .into_iter()
        .filter_map(|group| group.into_iter().next())
        .collect();

    representatives.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    representatives
}

/// Split an already-sorted sequence into runs of equal `sort_key`.
fn group_runs(sorted: Vec<IndexEntry>) -> Vec<Vec<IndexEntry>> {
    let mut groups: Vec<Vec<IndexEntry>> = Vec::new();
    for entry in sorted {
        match groups.last_mut() {
            Some(run) if run[0].sort_key == entry.sort_key => run.push(entry),
            _ => groups.push(vec![entry]),
        }
    }
    groups
}

/// Render the index document for `tag` from an unordered list of entries.
#[must_use]
pub fn render_index(entries: Vec<IndexEntry>, tag: &str) -> String {
    let label = tag.strip_prefix('-').unwrap_or(tag);
    let mut out = String::new();
    out.push('#');
    out.push_str(label);
    out.push_str("\n\n");

    let mut anchor: Option<char> = None;
    for entry in collapse_entries(entries) {
        if anchor != Some(entry.anchor) {
            anchor = Some(entry.anchor);
            out.push_str("\n\n##");
            out.extend(entry.anchor.to_uppercase());
            out.push_str("\n\n");
        }
        out.push_str(&entry.display_markdown);
    }
    out
}

/// Parse and re-render an existing document without changing its content.
#[must_use]
pub fn rerender(text: &str, tag: &str) -> String {
    render_index(parse_index(text), tag)
}
