//! Command handlers: tag updates, locks, reloads, and message routing.

use std::sync::Arc;

use tagbot_core::gate::{AuthorizationContext, GateDecision};
use tagbot_core::snapshot::{LOCKED_PAGE, read_locked, render_locked};
use tagbot_core::{
    Forum, Message, ReplyTarget, Result, Submission, mutate_index, parse_tag_command,
    plan_mutations, replies,
};

use crate::session::TagBot;

/// How a tag request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// Requester may not tag this submission.
    NotMember,
    /// Submission is locked.
    Locked,
    /// The listed number of index pages were rewritten.
    Applied { pages_written: usize },
}

impl<F: Forum> TagBot<F> {
    /// Parse `body`, run it through the gate, rewrite the touched index pages,
    /// and reply to `target`.
    ///
    /// An index page that does not exist yet starts empty; a page that cannot
    /// be read aborts the request before anything is written for it.
    pub fn apply_tags(
        &mut self,
        requester: &str,
        submission: &Submission,
        body: &str,
        prefix: &str,
        target: &ReplyTarget,
    ) -> Result<TagOutcome> {
        let snapshot = Arc::clone(&self.snapshot);
        let request = parse_tag_command(body, prefix, &snapshot.accepted_tags);
        tracing::debug!(
            added = request.added.len(),
            removed = request.removed.len(),
            "found tags"
        );

        let ctx = AuthorizationContext::new(requester, submission, &snapshot);
        let approved = match ctx.evaluate(request) {
            GateDecision::NotMember { contact } => {
                self.send_reply(target, &replies::not_a_member(&contact));
                return Ok(TagOutcome::NotMember);
            }
            GateDecision::Locked => {
                self.send_reply(target, replies::LOCKED);
                return Ok(TagOutcome::Locked);
            }
            GateDecision::Proceed(approved) => approved,
        };

        let mut pages_written = 0;
        for (tag, operation) in plan_mutations(&approved.request) {
            let page = self.config.page_name(tag.display());
            let current = self.forum.read_page(&page)?.unwrap_or_default();
            let updated = mutate_index(&current, &tag, submission, &self.config.subreddit, operation);
            self.forum.write_page(&page, &updated)?;
            pages_written += 1;
            tracing::info!(
                page = page.as_str(),
                operation = ?operation,
                title = submission.title.as_str(),
                requester,
                "index updated"
            );
        }

        let summary = replies::tag_summary(&approved, &self.config);
        self.send_reply(target, &summary);
        Ok(TagOutcome::Applied { pages_written })
    }

    /// Route one private message. The caller marks it read afterwards.
    pub(crate) fn handle_message(&mut self, message: &Message) -> Result<()> {
        let target = ReplyTarget::from(message);
        let subject = message.subject.trim();

        if subject.eq_ignore_ascii_case(&self.config.reload_subject) {
            self.handle_reload(message, &target);
            return Ok(());
        }

        let Some(submission) = self.resolve_submission(subject, &target) else {
            tracing::debug!(subject, "discarding message");
            return Ok(());
        };

        let body = message.body.trim_start();
        if body.starts_with(&self.config.tag_command_prefix) {
            let prefix = self.config.tag_command_prefix.clone();
            self.apply_tags(&message.author, &submission, body, &prefix, &target)?;
        } else if body.starts_with(&self.config.lock_command_prefix) {
            self.handle_lock(message, &submission, body, &target)?;
        } else {
            tracing::debug!(subject, "message has no command; discarding");
        }
        Ok(())
    }

    /// Resolve a message subject to a submission in the configured venue,
    /// replying to the sender when that is not possible.
    fn resolve_submission(&mut self, subject: &str, target: &ReplyTarget) -> Option<Submission> {
        let submission = match self.forum.submission(subject) {
            Ok(Some(submission)) => submission,
            Ok(None) => {
                let text = replies::unresolvable_subject(subject, "no submission at that address");
                self.send_reply(target, &text);
                return None;
            }
            Err(e) => {
                tracing::warn!(subject, error = %e, "not a submission?");
                self.send_reply(target, &replies::unresolvable_subject(subject, &e.to_string()));
                return None;
            }
        };

        if submission.is_in(&self.config.subreddit) {
            return Some(submission);
        }
        let other = submission.venue().unwrap_or("an unknown venue").to_string();
        tracing::debug!(
            subject,
            venue = other.as_str(),
            "submission belongs to another venue"
        );
        let text = replies::foreign_venue(&self.config.subreddit, &other);
        self.send_reply(target, &text);
        None
    }

    /// Only moderators may reload; the reload does not run otherwise.
    fn handle_reload(&mut self, message: &Message, target: &ReplyTarget) {
        if !self.snapshot.is_moderator(&message.author) {
            tracing::info!(author = message.author.as_str(), "reload refused for non-moderator");
            self.send_reply(target, replies::RELOAD_REFUSED);
            return;
        }
        if self.refresh() {
            self.send_reply(target, replies::RELOADED);
        } else {
            self.send_reply(target, replies::RELOAD_FAILED);
        }
    }

    /// Lock a submission: apply any tags in the same message against the
    /// pre-lock snapshot, then record the permalink on the locked page and
    /// in the live snapshot.
    fn handle_lock(
        &mut self,
        message: &Message,
        submission: &Submission,
        body: &str,
        target: &ReplyTarget,
    ) -> Result<()> {
        let snapshot = Arc::clone(&self.snapshot);
        let ctx = AuthorizationContext::new(&message.author, submission, &snapshot);
        if !ctx.is_author_or_moderator() {
            self.send_reply(target, replies::LOCK_REFUSED);
            return Ok(());
        }
        if ctx.is_locked() {
            tracing::debug!(permalink = submission.permalink.as_str(), "already locked");
            self.send_reply(target, replies::LOCKED);
            return Ok(());
        }

        let prefix = self.config.lock_command_prefix.clone();
        self.apply_tags(&message.author, submission, body, &prefix, target)?;

        let mut locked = read_locked(&mut self.forum, &self.config)?;
        locked.insert(submission.permalink.clone());
        self.forum
            .write_page(&self.config.page_name(LOCKED_PAGE), &render_locked(&locked))?;

        let mut next = snapshot.with_locked(&submission.permalink);
        next.locked.extend(locked);
        self.snapshot = Arc::new(next);
        tracing::info!(
            permalink = submission.permalink.as_str(),
            author = message.author.as_str(),
            "submission locked"
        );
        self.send_reply(target, replies::LOCK_ACCEPTED);
        Ok(())
    }
}
