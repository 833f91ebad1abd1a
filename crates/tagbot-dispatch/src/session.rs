//! The polling state machine.
//!
//! One [`TagBot`] owns a forum connection and a configuration snapshot and
//! drives cycles of `Idle -> Fetching -> Processing -> Persisting -> Idle`,
//! with `Reloading` entered when the snapshot is rebuilt.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tagbot_core::snapshot::WATERMARK_PAGE;
use tagbot_core::{BotConfig, Comment, Config, Forum, Message, ReplyTarget, Watermark};

use crate::error::{DispatchError, Result};

/// Where the bot is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Fetching,
    Processing,
    Persisting,
    Reloading,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Processing => "processing",
            Self::Persisting => "persisting",
            Self::Reloading => "reloading",
        };
        f.write_str(name)
    }
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub comments_handled: usize,
    pub messages_handled: usize,
    /// Watermark written back at the end of the cycle.
    pub watermark: Watermark,
    /// Whether the periodic configuration refresh ran after this cycle.
    pub refreshed: bool,
}

#[derive(Debug, Default)]
struct Progress {
    comments_handled: usize,
    messages_handled: usize,
}

/// The dispatcher: one forum, one configuration snapshot.
pub struct TagBot<F: Forum> {
    pub(crate) forum: F,
    pub(crate) config: Config,
    pub(crate) snapshot: Arc<BotConfig>,
    pub(crate) state: SessionState,
    cycles: u64,
    /// A reload failed; retry once this instant has passed.
    retry_refresh_at: Option<Instant>,
}

impl<F: Forum> fmt::Debug for TagBot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagBot")
            .field("subreddit", &self.config.subreddit)
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .finish_non_exhaustive()
    }
}

impl<F: Forum> TagBot<F> {
    /// Load the configuration snapshot and return an idle bot.
    ///
    /// Fails with `ConfigUnavailable` when a required page is missing.
    pub fn start(mut forum: F, config: Config) -> tagbot_core::Result<Self> {
        let snapshot = BotConfig::load(&mut forum, &config)?;
        tracing::info!(
            subreddit = config.subreddit.as_str(),
            accepted = snapshot.accepted_tags.len(),
            volunteers = snapshot.volunteers.len(),
            moderators = snapshot.moderators.len(),
            locked = snapshot.locked.len(),
            "tag bot configured"
        );
        Ok(Self {
            forum,
            config,
            snapshot: Arc::new(snapshot),
            state: SessionState::Idle,
            cycles: 0,
            retry_refresh_at: None,
        })
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<BotConfig> {
        Arc::clone(&self.snapshot)
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn forum(&self) -> &F {
        &self.forum
    }

    pub const fn forum_mut(&mut self) -> &mut F {
        &mut self.forum
    }

    pub fn into_forum(self) -> F {
        self.forum
    }

    /// Completed cycles since start.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one polling cycle.
    ///
    /// The watermark is written back whether or not processing succeeded; a
    /// failure to write it is [`DispatchError::WatermarkPersist`] and takes
    /// precedence over any processing error.
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        self.state = SessionState::Fetching;
        tracing::debug!("waking up");

        let start = match self.read_watermark() {
            Ok(mark) => mark,
            Err(e) => {
                self.state = SessionState::Idle;
                return Err(e.into());
            }
        };

        let mut mark = start;
        let mut progress = Progress::default();
        let outcome = self.process(start, &mut mark, &mut progress);

        self.state = SessionState::Persisting;
        let persisted = self
            .forum
            .write_page(&self.config.page_name(WATERMARK_PAGE), &mark.to_string());
        self.state = SessionState::Idle;
        if let Err(source) = persisted {
            tracing::error!(watermark = %mark, error = %source, "failed to persist watermark");
            return Err(DispatchError::WatermarkPersist {
                watermark: mark.to_string(),
                source,
            });
        }
        outcome?;

        self.cycles += 1;
        let refreshed = self.refresh_due() && self.refresh();
        tracing::debug!(
            comments = progress.comments_handled,
            messages = progress.messages_handled,
            watermark = %mark,
            "cycle complete"
        );
        Ok(CycleReport {
            comments_handled: progress.comments_handled,
            messages_handled: progress.messages_handled,
            watermark: mark,
            refreshed,
        })
    }

    fn read_watermark(&mut self) -> tagbot_core::Result<Watermark> {
        let page = self.config.page_name(WATERMARK_PAGE);
        Ok(self
            .forum
            .read_page(&page)?
            .map_or_else(Watermark::default, |text| Watermark::parse(&text)))
    }

    fn process(
        &mut self,
        start: Watermark,
        mark: &mut Watermark,
        progress: &mut Progress,
    ) -> tagbot_core::Result<()> {
        let comments = self.forum.recent_comments(self.config.comment_limit)?;
        self.state = SessionState::Processing;

        let mut pending: Vec<Comment> = comments
            .into_iter()
            .filter(|c| self.is_new_command(c, start))
            .collect();
        // Oldest first, so an aborted cycle never skips past an unhandled comment.
        pending.sort_by(|a, b| a.created.total_cmp(&b.created));

        for comment in &pending {
            tracing::debug!(id = comment.id.as_str(), author = comment.author.as_str(), "processing comment");
            let prefix = self.config.tag_command_prefix.clone();
            self.apply_tags(
                &comment.author,
                &comment.submission,
                &comment.body,
                &prefix,
                &ReplyTarget::from(comment),
            )?;
            mark.observe(comment.created);
            progress.comments_handled += 1;
        }

        self.state = SessionState::Fetching;
        let messages = self.forum.unread_messages()?;
        self.state = SessionState::Processing;
        for message in &messages {
            let handled = self.handle_message(message);
            self.mark_read(message);
            handled?;
            progress.messages_handled += 1;
        }
        Ok(())
    }

    /// A tag command newer than `mark` that was never edited.
    fn is_new_command(&self, comment: &Comment, mark: Watermark) -> bool {
        comment.body.starts_with(&self.config.tag_command_prefix)
            && mark.admits(comment.created)
            && !comment.edited
    }

    fn refresh_due(&self) -> bool {
        let every = self.config.config_refresh_cycles;
        let retry_due = self
            .retry_refresh_at
            .is_some_and(|at| Instant::now() >= at);
        retry_due || (every > 0 && self.cycles.is_multiple_of(every))
    }

    /// Rebuild the snapshot from the forum. On failure the current snapshot
    /// stays in place, `false` is returned, and the reload is retried at the
    /// end of the first cycle that finishes after the config retry delay.
    pub fn refresh(&mut self) -> bool {
        let previous = self.state;
        self.state = SessionState::Reloading;
        let loaded = BotConfig::load(&mut self.forum, &self.config);
        self.state = previous;
        match loaded {
            Ok(snapshot) => {
                tracing::info!(
                    accepted = snapshot.accepted_tags.len(),
                    volunteers = snapshot.volunteers.len(),
                    locked = snapshot.locked.len(),
                    "configuration reloaded"
                );
                self.snapshot = Arc::new(snapshot);
                self.retry_refresh_at = None;
                true
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    error_type = e.error_type(),
                    "configuration reload failed; keeping previous settings"
                );
                self.retry_refresh_at = Some(Instant::now() + self.config.config_retry_delay());
                false
            }
        }
    }

    /// Post a reply; failures are logged, never propagated.
    pub(crate) fn send_reply(&mut self, target: &ReplyTarget, text: &str) {
        if let Err(e) = self.forum.reply(target, text) {
            tracing::warn!(target = target.id(), error = %e, "failed to post reply");
        }
    }

    /// Mark a message consumed; failures are logged, never propagated.
    fn mark_read(&mut self, message: &Message) {
        if let Err(e) = self.forum.mark_read(message) {
            tracing::warn!(id = message.id.as_str(), error = %e, "failed to mark message read");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagbot_test_helpers::fixtures;

    #[test]
    fn start_requires_config_pages() {
        let config = fixtures::config();
        let mut forum = fixtures::standard_forum(&config);
        forum.pages.remove("tags/codexkeeper");
        let err = TagBot::start(forum, config).expect_err("missing contact page");
        assert_eq!(err.error_type(), "CONFIG_UNAVAILABLE");
    }

    #[test]
    fn empty_cycle_writes_zero_watermark_and_returns_idle() {
        let config = fixtures::config();
        let forum = fixtures::standard_forum(&config);
        let mut bot = TagBot::start(forum, config).expect("start");
        assert_eq!(bot.state(), SessionState::Idle);

        let report = bot.run_cycle().expect("cycle");
        assert_eq!(report.comments_handled, 0);
        assert_eq!(bot.state(), SessionState::Idle);
        assert_eq!(bot.forum().page("tags/last_seen"), Some("0"));
    }

    #[test]
    fn refresh_runs_every_n_cycles() {
        let config = Config {
            config_refresh_cycles: 2,
            ..fixtures::config()
        };
        let forum = fixtures::standard_forum(&config);
        let mut bot = TagBot::start(forum, config).expect("start");
        let refreshed: Vec<bool> = (0..4)
            .map(|_| bot.run_cycle().expect("cycle").refreshed)
            .collect();
        assert_eq!(refreshed, vec![false, true, false, true]);
    }

    #[test]
    fn failed_refresh_is_retried_once_delay_passes() {
        let config = Config {
            config_refresh_cycles: 0,
            ..fixtures::config()
        };
        let forum = fixtures::standard_forum(&config);
        let mut bot = TagBot::start(forum, config).expect("start");
        bot.forum_mut().fail_moderator_list(true);
        assert!(!bot.refresh());

        bot.forum_mut().fail_moderator_list(false);
        bot.forum_mut().set_page("tags/accepted", "* [Misc]\n");
        let report = bot.run_cycle().expect("cycle");
        assert!(report.refreshed);
        assert!(bot.snapshot().accepted_tags.contains("misc"));
        assert!(!bot.run_cycle().expect("cycle").refreshed);
    }

    #[test]
    fn failed_refresh_waits_for_retry_delay() {
        let config = Config {
            config_refresh_cycles: 0,
            config_retry_seconds: 3600,
            ..fixtures::config()
        };
        let forum = fixtures::standard_forum(&config);
        let mut bot = TagBot::start(forum, config).expect("start");
        bot.forum_mut().fail_moderator_list(true);
        assert!(!bot.refresh());

        bot.forum_mut().fail_moderator_list(false);
        bot.forum_mut().set_page("tags/accepted", "* [Misc]\n");
        assert!(!bot.run_cycle().expect("cycle").refreshed);
        assert!(!bot.snapshot().accepted_tags.contains("misc"));
    }

    #[test]
    fn state_names_are_lowercase() {
        assert_eq!(SessionState::Persisting.to_string(), "persisting");
    }
}
