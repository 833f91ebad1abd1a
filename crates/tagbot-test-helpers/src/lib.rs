//! Shared test helpers for the tag bot crates
//!
//! [`MemoryForum`] is an in-memory [`Forum`] that records every side effect
//! (page writes, replies, mark-reads) so tests can assert on exactly what the
//! bot did. [`fixtures`] builds the standard configuration pages, submissions,
//! comments and messages.

#![forbid(unsafe_code)]

pub mod fixtures;

use std::collections::{BTreeMap, BTreeSet};

use tagbot_core::error::{Error, Result};
use tagbot_core::{Comment, Forum, Message, ReplyTarget, Submission};

/// In-memory forum with failure injection.
#[derive(Debug, Default, Clone)]
pub struct MemoryForum {
    pub pages: BTreeMap<String, String>,
    /// Feed returned by `recent_comments`, in the order given.
    pub comments: Vec<Comment>,
    pub inbox: Vec<Message>,
    /// Submissions by URL (permalink or link URL).
    pub submissions: BTreeMap<String, Submission>,
    pub moderators: BTreeSet<String>,

    // Recorded side effects
    pub writes: Vec<(String, String)>,
    pub replies: Vec<(ReplyTarget, String)>,
    pub marked_read: Vec<String>,
    pub calls: usize,

    // Failure injection
    failing_reads: BTreeSet<String>,
    failing_writes: BTreeSet<String>,
    fail_comments: bool,
    fail_replies: bool,
    fail_moderators: bool,
}

impl MemoryForum {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_page(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.pages.insert(name.into(), text.into());
    }

    #[must_use]
    pub fn page(&self, name: &str) -> Option<&str> {
        self.pages.get(name).map(String::as_str)
    }

    /// Register a submission under its permalink and, if set, its link URL.
    pub fn add_submission(&mut self, submission: &Submission) {
        self.submissions
            .insert(submission.permalink.clone(), submission.clone());
        if !submission.url.is_empty() {
            self.submissions
                .insert(submission.url.clone(), submission.clone());
        }
    }

    /// Make reads of `name` fail with a platform error.
    pub fn fail_reads_of(&mut self, name: impl Into<String>) {
        self.failing_reads.insert(name.into());
    }

    /// Make writes of `name` fail with a platform error.
    pub fn fail_writes_of(&mut self, name: impl Into<String>) {
        self.failing_writes.insert(name.into());
    }

    pub const fn fail_comment_feed(&mut self, fail: bool) {
        self.fail_comments = fail;
    }

    pub const fn fail_replies(&mut self, fail: bool) {
        self.fail_replies = fail;
    }

    pub const fn fail_moderator_list(&mut self, fail: bool) {
        self.fail_moderators = fail;
    }

    /// Page writes other than the ones named in `except`.
    #[must_use]
    pub fn writes_excluding(&self, except: &[&str]) -> Vec<&(String, String)> {
        self.writes
            .iter()
            .filter(|(name, _)| !except.contains(&name.as_str()))
            .collect()
    }

    /// Texts of replies posted to `target`.
    #[must_use]
    pub fn replies_to(&self, target: &ReplyTarget) -> Vec<&str> {
        self.replies
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, text)| text.as_str())
            .collect()
    }

    /// How many times the message with `id` was marked read.
    #[must_use]
    pub fn mark_read_count(&self, id: &str) -> usize {
        self.marked_read.iter().filter(|m| *m == id).count()
    }
}

impl Forum for MemoryForum {
    fn read_page(&mut self, name: &str) -> Result<Option<String>> {
        self.calls += 1;
        if self.failing_reads.contains(name) {
            return Err(Error::Platform(format!("injected read failure for {name}")));
        }
        Ok(self.pages.get(name).cloned())
    }

    fn write_page(&mut self, name: &str, text: &str) -> Result<()> {
        self.calls += 1;
        if self.failing_writes.contains(name) {
            return Err(Error::Platform(format!("injected write failure for {name}")));
        }
        tracing::debug!(page = name, bytes = text.len(), "memory forum write");
        self.pages.insert(name.to_string(), text.to_string());
        self.writes.push((name.to_string(), text.to_string()));
        Ok(())
    }

    fn recent_comments(&mut self, limit: usize) -> Result<Vec<Comment>> {
        self.calls += 1;
        if self.fail_comments {
            return Err(Error::Platform("injected comment feed failure".into()));
        }
        Ok(self.comments.iter().take(limit).cloned().collect())
    }

    fn unread_messages(&mut self) -> Result<Vec<Message>> {
        self.calls += 1;
        Ok(self
            .inbox
            .iter()
            .filter(|m| !self.marked_read.contains(&m.id))
            .cloned()
            .collect())
    }

    fn reply(&mut self, target: &ReplyTarget, text: &str) -> Result<()> {
        self.calls += 1;
        if self.fail_replies {
            return Err(Error::Platform("injected reply failure".into()));
        }
        self.replies.push((target.clone(), text.to_string()));
        Ok(())
    }

    fn mark_read(&mut self, message: &Message) -> Result<()> {
        self.calls += 1;
        self.marked_read.push(message.id.clone());
        Ok(())
    }

    fn moderators(&mut self) -> Result<BTreeSet<String>> {
        self.calls += 1;
        if self.fail_moderators {
            return Err(Error::Platform("injected moderator list failure".into()));
        }
        Ok(self.moderators.clone())
    }

    fn submission(&mut self, url: &str) -> Result<Option<Submission>> {
        self.calls += 1;
        Ok(self.submissions.get(url).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn records_writes_and_failures() {
        let mut forum = MemoryForum::new();
        forum.write_page("tags/Oc", "#Oc\n\n").expect("write");
        forum.fail_writes_of("tags/last_seen");
        assert!(forum.write_page("tags/last_seen", "1").is_err());
        assert_eq!(forum.writes.len(), 1);
        assert_eq!(forum.page("tags/Oc"), Some("#Oc\n\n"));
        assert_eq!(forum.calls, 2);
    }

    #[test]
    fn marked_messages_leave_the_inbox() {
        let mut forum = MemoryForum::new();
        let s = fixtures::story("1", "Tale", "writer");
        forum.inbox.push(fixtures::message("m1", "writer", &s.permalink, "tags: oc"));
        forum.inbox.push(fixtures::message("m2", "writer", "reload", ""));
        let first = forum.unread_messages().expect("inbox");
        forum.mark_read(&first[0]).expect("mark");
        let rest = forum.unread_messages().expect("inbox");
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, "m2");
        assert_eq!(forum.mark_read_count("m1"), 1);
    }

    #[test]
    fn comment_feed_respects_limit() {
        let mut forum = MemoryForum::new();
        let s = fixtures::story("1", "Tale", "writer");
        for i in 0..5 {
            forum
                .comments
                .push(fixtures::comment(&format!("c{i}"), "writer", "tags: oc", f64::from(i), &s));
        }
        assert_eq!(forum.recent_comments(3).expect("feed").len(), 3);
    }
}
