//! Fixed cooldown before every platform call.

use std::collections::BTreeSet;
use std::time::Duration;

use tagbot_core::{Comment, Forum, Message, ReplyTarget, Result, Submission};

/// Something that can wait. Tests substitute a recorder for the real sleep.
pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<P: Pause + ?Sized> Pause for &mut P {
    fn pause(&mut self, duration: Duration) {
        (**self).pause(duration);
    }
}

/// Wraps a [`Forum`] and pauses for a fixed cooldown before each call.
///
/// The cooldown does not grow on failure.
#[derive(Debug)]
pub struct Paced<F, P = ThreadSleep> {
    inner: F,
    pause: P,
    cooldown: Duration,
}

impl<F: Forum> Paced<F> {
    #[must_use]
    pub const fn new(inner: F, cooldown: Duration) -> Self {
        Self::with_pause(inner, cooldown, ThreadSleep)
    }
}

impl<F: Forum, P: Pause> Paced<F, P> {
    #[must_use]
    pub const fn with_pause(inner: F, cooldown: Duration, pause: P) -> Self {
        Self {
            inner,
            pause,
            cooldown,
        }
    }

    #[must_use]
    pub const fn inner(&self) -> &F {
        &self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }

    fn wait(&mut self) {
        self.pause.pause(self.cooldown);
    }
}

impl<F: Forum, P: Pause> Forum for Paced<F, P> {
    fn read_page(&mut self, name: &str) -> Result<Option<String>> {
        self.wait();
        self.inner.read_page(name)
    }

    fn write_page(&mut self, name: &str, text: &str) -> Result<()> {
        self.wait();
        self.inner.write_page(name, text)
    }

    fn recent_comments(&mut self, limit: usize) -> Result<Vec<Comment>> {
        self.wait();
        self.inner.recent_comments(limit)
    }

    fn unread_messages(&mut self) -> Result<Vec<Message>> {
        self.wait();
        self.inner.unread_messages()
    }

    fn reply(&mut self, target: &ReplyTarget, text: &str) -> Result<()> {
        self.wait();
        self.inner.reply(target, text)
    }

    fn mark_read(&mut self, message: &Message) -> Result<()> {
        self.wait();
        self.inner.mark_read(message)
    }

    fn moderators(&mut self) -> Result<BTreeSet<String>> {
        self.wait();
        self.inner.moderators()
    }

    fn submission(&mut self, url: &str) -> Result<Option<Submission>> {
        self.wait();
        self.inner.submission(url)
    }
}
