//! The moderator-editable configuration, read from wiki pages.
//!
//! A [`BotConfig`] is an immutable snapshot. Reloading builds a new one and
//! the owner swaps it in whole; nothing mutates a snapshot field by field.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::forum::Forum;
use crate::models::Submission;
use crate::tags::parse_accepted_tags;

/// Page listing accepted tags as `[tag]` tokens.
pub const ACCEPTED_PAGE: &str = "accepted";
/// Page listing volunteers as `/u/name` mentions.
pub const VOLUNTEERS_PAGE: &str = "volunteers";
/// Page naming the escalation contact as a `/u/name` mention.
pub const CONTACT_PAGE: &str = "codexkeeper";
/// Page listing locked submissions as `* <url>` lines.
pub const LOCKED_PAGE: &str = "locked";
/// Page holding the watermark.
pub const WATERMARK_PAGE: &str = "last_seen";

static USER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/u/([A-Za-z0-9_-]+)").expect("valid user regex"));

static LOCKED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\* (\S+)").expect("valid locked regex"));

/// Snapshot of the wiki-held configuration plus the moderator list.
///
/// Identities are stored lowercased; comparisons are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotConfig {
    pub accepted_tags: BTreeSet<String>,
    pub volunteers: BTreeSet<String>,
    pub moderators: BTreeSet<String>,
    /// Who to ask for volunteer status, as written on the page.
    pub escalation_contact: String,
    pub locked: BTreeSet<String>,
}

impl BotConfig {
    /// Read every configuration page and the moderator list.
    ///
    /// A missing accepted/volunteers/contact page, or a contact page with no
    /// `/u/` mention, is [`Error::ConfigUnavailable`]. A missing locked page
    /// means nothing is locked yet.
    pub fn load<F: Forum + ?Sized>(forum: &mut F, config: &Config) -> Result<Self> {
        let accepted_text = required_page(forum, config, ACCEPTED_PAGE)?;
        let accepted_tags = parse_accepted_tags(&accepted_text);
        if accepted_tags.is_empty() {
            return Err(Error::config_unavailable(
                config.page_name(ACCEPTED_PAGE),
                "no [tag] tokens on page",
            ));
        }

        let volunteers_text = required_page(forum, config, VOLUNTEERS_PAGE)?;
        let volunteers = parse_user_mentions(&volunteers_text)
            .into_iter()
            .map(|u| u.to_lowercase())
            .collect();

        let contact_text = required_page(forum, config, CONTACT_PAGE)?;
        let escalation_contact = parse_user_mentions(&contact_text)
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::config_unavailable(config.page_name(CONTACT_PAGE), "no /u/ mention on page")
            })?;

        let moderators = forum
            .moderators()
            .map_err(|e| Error::config_unavailable("moderators", e.to_string()))?
            .into_iter()
            .map(|m| m.to_lowercase())
            .collect();

        let locked = read_locked(forum, config)?;

        Ok(Self {
            accepted_tags,
            volunteers,
            moderators,
            escalation_contact,
            locked,
        })
    }

    #[must_use]
    pub fn is_moderator(&self, user: &str) -> bool {
        self.moderators.contains(&user.to_lowercase())
    }

    #[must_use]
    pub fn is_volunteer(&self, user: &str) -> bool {
        self.volunteers.contains(&user.to_lowercase())
    }

    /// Whether the submission is locked, by permalink or link URL.
    #[must_use]
    pub fn is_locked(&self, submission: &Submission) -> bool {
        self.locked.contains(&submission.permalink)
            || (!submission.url.is_empty() && self.locked.contains(&submission.url))
    }

    /// A new snapshot with `permalink` added to the locked set.
    #[must_use]
    pub fn with_locked(&self, permalink: &str) -> Self {
        let mut next = self.clone();
        next.locked.insert(permalink.to_string());
        next
    }
}

fn required_page<F: Forum + ?Sized>(forum: &mut F, config: &Config, page: &str) -> Result<String> {
    let name = config.page_name(page);
    match forum.read_page(&name) {
        Ok(Some(text)) => Ok(text),
        Ok(None) => Err(Error::config_unavailable(name, "page does not exist")),
        Err(e) => Err(Error::config_unavailable(name, e.to_string())),
    }
}

/// Read the locked list; a page that does not exist yet is an empty list.
pub fn read_locked<F: Forum + ?Sized>(forum: &mut F, config: &Config) -> Result<BTreeSet<String>> {
    let name = config.page_name(LOCKED_PAGE);
    match forum.read_page(&name) {
        Ok(Some(text)) => Ok(parse_locked(&text)),
        Ok(None) => {
            tracing::debug!(page = name.as_str(), "no locked list yet");
            Ok(BTreeSet::new())
        }
        Err(e) => Err(Error::config_unavailable(name, e.to_string())),
    }
}

/// All `/u/name` mentions in order of appearance.
#[must_use]
pub fn parse_user_mentions(text: &str) -> Vec<String> {
    USER_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// URLs on the locked page, one `* <url>` per line.
#[must_use]
pub fn parse_locked(text: &str) -> BTreeSet<String> {
    LOCKED_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Render the locked page: deduplicated, sorted, blank line after each entry.
#[must_use]
pub fn render_locked(locked: &BTreeSet<String>) -> String {
    locked.iter().map(|url| format!("* {url}\n\n")).collect()
}
