//! Tag names and the `tags:` command grammar
//!
//! A tag is matched case-insensitively against the accepted set; the
//! title-cased spelling names its index page (`j-verse` -> `tags/J-Verse`).

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static BRACKET_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]\n]+)\]").expect("valid bracket token regex"));

/// A tag as named in a command: title-cased for display and page names,
/// compared by its lowercase key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagName {
    key: String,
    display: String,
}

impl TagName {
    /// Build a tag from user input. A leading `-` (removal marker) is dropped.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let bare = raw.trim().trim_start_matches('-');
        Self {
            key: bare.to_lowercase(),
            display: title_case(bare),
        }
    }

    /// Lowercase comparison key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Title-cased spelling, used for page names and replies.
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Title-case every word: a letter following a non-letter is uppercased, any
/// other letter lowercased (`j-verse` -> `J-Verse`, `NSFW` -> `Nsfw`).
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Extract the accepted tag keys (lowercased) from the `accepted` page:
/// every `[token]` on the page names one tag.
#[must_use]
pub fn parse_accepted_tags(text: &str) -> BTreeSet<String> {
    BRACKET_TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// The additions and removals named by one `tags:` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRequest {
    pub added: Vec<TagName>,
    pub removed: Vec<TagName>,
}

/// Parse the body of a tag command.
///
/// Everything after `prefix` is split on commas and whitespace. A token is an
/// addition when its lowercase form is accepted, and `-token` is a removal
/// under the same rule. Unknown tokens are ignored. A tag named both ways is
/// only removed.
#[must_use]
pub fn parse_tag_command(body: &str, prefix: &str, accepted: &BTreeSet<String>) -> TagRequest {
    let rest = body.strip_prefix(prefix).unwrap_or(body);
    let mut request = TagRequest::default();

    for token in rest.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        if let Some(bare) = token.strip_prefix('-') {
            if accepted.contains(&bare.to_lowercase()) {
                push_unique(&mut request.removed, TagName::new(bare));
            }
        } else if accepted.contains(&token.to_lowercase()) {
            push_unique(&mut request.added, TagName::new(token));
        }
    }

    let removed = &request.removed;
    request
        .added
        .retain(|tag| !removed.iter().any(|r| r.key() == tag.key()));
    request
}

fn push_unique(list: &mut Vec<TagName>, tag: TagName) {
    if !list.iter().any(|existing| existing.key() == tag.key()) {
        list.push(tag);
    }
}
