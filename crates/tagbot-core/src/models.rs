//! Data models exchanged with the forum
//!
//! These mirror what the forum platform hands the bot: submissions, comments
//! on them, and private messages. Timestamps are the platform's fractional
//! epoch seconds.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static VENUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/r/([^/\s]+)").expect("valid venue regex"));

// =============================================================================
// Submission
// =============================================================================

/// A post that can carry tags.
///
/// `permalink` identifies the submission in the locked list and in index
/// lines; `url` is the link target of a link post (equal to the permalink for
/// text posts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub title: String,
    pub permalink: String,
    #[serde(default)]
    pub url: String,
    pub author: String,
}

impl Submission {
    /// The venue (`/r/<name>/` segment) the submission was posted to.
    #[must_use]
    pub fn venue(&self) -> Option<&str> {
        VENUE_RE
            .captures(&self.permalink)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Whether the submission belongs to `subreddit` (case-insensitive).
    #[must_use]
    pub fn is_in(&self, subreddit: &str) -> bool {
        self.venue()
            .is_some_and(|venue| venue.eq_ignore_ascii_case(subreddit))
    }
}

// =============================================================================
// Comment
// =============================================================================

/// A comment from the venue's recent-comment feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    /// Creation time, epoch seconds.
    pub created: f64,
    #[serde(default)]
    pub edited: bool,
    pub submission: Submission,
}

// =============================================================================
// Message
// =============================================================================

/// A private message sent to the bot.
///
/// For tag and lock commands the subject carries the submission URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub author: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub created: f64,
}

// =============================================================================
// Reply target
// =============================================================================

/// Where a reply is posted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReplyTarget {
    Comment(String),
    Message(String),
}

impl ReplyTarget {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Comment(id) | Self::Message(id) => id,
        }
    }
}

impl From<&Comment> for ReplyTarget {
    fn from(comment: &Comment) -> Self {
        Self::Comment(comment.id.clone())
    }
}

impl From<&Message> for ReplyTarget {
    fn from(message: &Message) -> Self {
        Self::Message(message.id.clone())
    }
}
