//! Parsing one index line into an [`IndexEntry`].
//!
//! Expected shape: `* [Title](permalink) - by: [author](/r/<sub>/wiki/<author>)`,
//! optionally with category markers such as `[OC]` before or inside the title.

use std::sync::LazyLock;

use regex::Regex;

/// Category markers stripped from titles before sorting.
pub const CATEGORY_MARKERS: &[&str] = &["oc", "pi", "jenkinsverse", "j-verse", "jverse", "misc", "nsfw"];

static CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\[(?:{})\]", CATEGORY_MARKERS.join("|")))
        .expect("valid category regex")
});

static LEADING_CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^\*\s*(?:\[(?:{})\]\s*)+",
        CATEGORY_MARKERS.join("|")
    ))
    .expect("valid leading category regex")
});

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\(([^()\s]+)\)").expect("valid link regex"));

/// One rendered line of an index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// The markdown emitted for this entry, including the trailing blank line.
    pub display_markdown: String,
    /// Lowercased title with category markers stripped; equal keys are the
    /// same submission.
    pub sort_key: String,
    /// Lowercase first character of `sort_key`; entries are grouped under it.
    pub anchor: char,
    /// Link to the submission; empty for degraded lines.
    pub permalink: String,
}

impl IndexEntry {
    /// An entry that keeps `raw` verbatim as both display text and sort key.
    #[must_use]
    pub fn degraded(raw: &str) -> Self {
        let text = raw.trim();
        Self {
            display_markdown: format!("{text}\n\n"),
            sort_key: text.to_string(),
            anchor: anchor_of(text),
            permalink: String::new(),
        }
    }
}

/// Outcome of parsing a line: either a structured entry or the raw text of a
/// line that did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Parsed(IndexEntry),
    Degraded(String),
}

impl ParsedLine {
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// The entry to render; degraded lines render verbatim.
    #[must_use]
    pub fn into_entry(self) -> IndexEntry {
        match self {
            Self::Parsed(entry) => entry,
            Self::Degraded(raw) => IndexEntry::degraded(&raw),
        }
    }
}

/// Parse one list line of an index page.
///
/// Never fails: a line without a `[title](link)` pair, or whose title is
/// empty once category markers are removed, comes back as
/// [`ParsedLine::Degraded`] and is logged.
#[must_use]
pub fn parse_line(line: &str) -> ParsedLine {
    let trimmed = line.trim();
    let normalized = LEADING_CATEGORY_RE.replace(trimmed, "* ");

    let Some(caps) = LINK_RE.captures(&normalized) else {
        tracing::warn!(line = trimmed, "index line has no [title](link) pair; keeping it verbatim");
        return ParsedLine::Degraded(trimmed.to_string());
    };
    let (Some(name), Some(link)) = (caps.get(1), caps.get(2)) else {
        return ParsedLine::Degraded(trimmed.to_string());
    };

    let title = clean_title(name.as_str());
    if title.is_empty() {
        tracing::warn!(line = trimmed, "index line has an empty title; keeping it verbatim");
        return ParsedLine::Degraded(trimmed.to_string());
    }

    let display = format!(
        "{}{}{}\n\n",
        &normalized[..name.start()],
        title,
        &normalized[name.end()..]
    );
    let sort_key = title.to_lowercase();
    ParsedLine::Parsed(IndexEntry {
        display_markdown: display,
        anchor: anchor_of(&sort_key),
        sort_key,
        permalink: link.as_str().to_string(),
    })
}

/// Sort key a submission title gets once it is written into an index.
#[must_use]
pub fn sort_key_for_title(title: &str) -> String {
    clean_title(title).to_lowercase()
}

/// Lines of `text` that are list items (`* ...`).
pub fn list_items(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("* "))
}

fn clean_title(name: &str) -> String {
    CATEGORY_RE.replace_all(name, "").trim().to_string()
}

fn anchor_of(key: &str) -> char {
    key.chars()
        .next()
        .and_then(|c| c.to_lowercase().next())
        .unwrap_or('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "* [First Contact](https://www.reddit.com/r/HFYBeta/comments/1/first_contact/) - by: [writer](/r/HFYBeta/wiki/writer)";

    fn parsed(line: &str) -> IndexEntry {
        match parse_line(line) {
            ParsedLine::Parsed(entry) => entry,
            ParsedLine::Degraded(raw) => panic!("expected a parsed entry, got degraded {raw:?}"),
        }
    }

    #[test]
    fn parses_well_formed_line() {
        let entry = parsed(LINE);
        assert_eq!(entry.sort_key, "first contact");
        assert_eq!(entry.anchor, 'f');
        assert_eq!(
            entry.permalink,
            "https://www.reddit.com/r/HFYBeta/comments/1/first_contact/"
        );
        assert_eq!(entry.display_markdown, format!("{LINE}\n\n"));
    }

    #[test]
    fn strips_category_markers_from_title() {
        let entry = parsed("* [[OC] [NSFW] Deathworlders](https://x/1) - by: [a](/r/HFY/wiki/a)");
        assert_eq!(entry.sort_key, "deathworlders");
        assert_eq!(
            entry.display_markdown,
            "* [Deathworlders](https://x/1) - by: [a](/r/HFY/wiki/a)\n\n"
        );
    }

    #[test]
    fn strips_leading_category_prefix() {
        let entry = parsed("* [oc] [Jverse] [Salvage](https://x/2) - by: [b](/r/HFY/wiki/b)");
        assert_eq!(entry.sort_key, "salvage");
        assert_eq!(entry.anchor, 's');
        assert_eq!(entry.permalink, "https://x/2");
        assert!(entry.display_markdown.starts_with("* [Salvage]"));
    }

    #[test]
    fn author_named_like_a_category_is_kept() {
        let entry = parsed("* [Story](https://x/3) - by: [misc](/r/HFY/wiki/misc)");
        assert!(entry.display_markdown.contains("[misc](/r/HFY/wiki/misc)"));
    }

    #[test]
    fn title_with_inner_brackets_keeps_them() {
        let entry = parsed("* [The [Redacted] Files](https://x/4) - by: [c](/r/HFY/wiki/c)");
        assert_eq!(entry.sort_key, "the [redacted] files");
    }

    #[test]
    fn line_without_link_degrades_verbatim() {
        let result = parse_line("* just some text someone typed  ");
        assert!(result.is_degraded());
        let entry = result.into_entry();
        assert_eq!(entry.sort_key, "* just some text someone typed");
        assert_eq!(entry.display_markdown, "* just some text someone typed\n\n");
        assert_eq!(entry.anchor, '*');
        assert!(entry.permalink.is_empty());
    }

    #[test]
    fn empty_title_degrades() {
        assert!(parse_line("* [[OC]](https://x/5) - by: [d](/r/HFY/wiki/d)").is_degraded());
    }

    #[test]
    fn sort_key_for_title_matches_parsed_key() {
        let title = "[OC] First Contact ";
        let line = format!("* [{title}](https://x/6) - by: [e](/r/HFY/wiki/e)");
        assert_eq!(sort_key_for_title(title), parsed(&line).sort_key);
    }

    #[test]
    fn list_items_skips_headings_and_prose() {
        let text = "#Oc\n\n\n\n##A\n\n* [A](https://x/a) - by: [a](/r/H/wiki/a)\n\nprose * not an item\n  * [B](https://x/b) - by: [b](/r/H/wiki/b)\n";
        let items: Vec<&str> = list_items(text).collect();
        assert_eq!(items.len(), 2);
        assert!(items[1].starts_with("* [B]"));
    }
}
