//! The forum platform as seen by the bot
//!
//! Every interaction with the outside world goes through [`Forum`]. The wiki
//! page store behind it is the single source of truth: the bot keeps no state
//! of its own and rereads pages on every decision.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::{Comment, Message, ReplyTarget, Submission};

/// Operations the bot needs from the forum platform.
///
/// Page names are full names including the wiki prefix (e.g. `tags/Oc`).
pub trait Forum {
    /// Read a wiki page. `Ok(None)` means the page does not exist.
    fn read_page(&mut self, name: &str) -> Result<Option<String>>;

    /// Overwrite a wiki page, creating it if needed.
    fn write_page(&mut self, name: &str, text: &str) -> Result<()>;

    /// The most recent comments in the venue, newest first, at most `limit`.
    fn recent_comments(&mut self, limit: usize) -> Result<Vec<Comment>>;

    /// Private messages not yet marked read.
    fn unread_messages(&mut self) -> Result<Vec<Message>>;

    /// Post a reply to a comment or message.
    fn reply(&mut self, target: &ReplyTarget, text: &str) -> Result<()>;

    /// Mark a private message as consumed.
    fn mark_read(&mut self, message: &Message) -> Result<()>;

    /// Current moderator identities of the venue.
    fn moderators(&mut self) -> Result<BTreeSet<String>>;

    /// Resolve a submission by URL. `Ok(None)` means nothing lives there.
    fn submission(&mut self, url: &str) -> Result<Option<Submission>>;
}

impl<F: Forum + ?Sized> Forum for &mut F {
    fn read_page(&mut self, name: &str) -> Result<Option<String>> {
        (**self).read_page(name)
    }

    fn write_page(&mut self, name: &str, text: &str) -> Result<()> {
        (**self).write_page(name, text)
    }

    fn recent_comments(&mut self, limit: usize) -> Result<Vec<Comment>> {
        (**self).recent_comments(limit)
    }

    fn unread_messages(&mut self) -> Result<Vec<Message>> {
        (**self).unread_messages()
    }

    fn reply(&mut self, target: &ReplyTarget, text: &str) -> Result<()> {
        (**self).reply(target, text)
    }

    fn mark_read(&mut self, message: &Message) -> Result<()> {
        (**self).mark_read(message)
    }

    fn moderators(&mut self) -> Result<BTreeSet<String>> {
        (**self).moderators()
    }

    fn submission(&mut self, url: &str) -> Result<Option<Submission>> {
        (**self).submission(url)
    }
}
