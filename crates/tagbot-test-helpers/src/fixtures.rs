//! Fixture builders for the standard test venue.
//!
//! The standard venue is `HFYBeta` with accepted tags `oc`, `pi`, `j-verse`,
//! `nsfw`; volunteer `helper`; moderator `modperson`; escalation contact
//! `Keeper`.

use tagbot_core::{Comment, Config, Message, Submission};

use crate::MemoryForum;

pub const SUBREDDIT: &str = "HFYBeta";
pub const VOLUNTEER: &str = "helper";
pub const MODERATOR: &str = "modperson";
pub const CONTACT: &str = "Keeper";

/// Process configuration with no pacing and default page names.
#[must_use]
pub fn config() -> Config {
    Config {
        pacing_seconds: 0,
        poll_interval_seconds: 0,
        config_retry_seconds: 0,
        restart_cooldown_seconds: 0,
        ..Config::default()
    }
}

/// A forum seeded with the standard configuration pages and moderator.
#[must_use]
pub fn standard_forum(config: &Config) -> MemoryForum {
    let mut forum = MemoryForum::new();
    forum.set_page(
        config.page_name("accepted"),
        "Accepted tags:\n\n* [OC]\n* [PI]\n* [J-Verse]\n* [NSFW]\n",
    );
    forum.set_page(
        config.page_name("volunteers"),
        format!("Volunteers:\n\n* /u/{VOLUNTEER}\n"),
    );
    forum.set_page(
        config.page_name("codexkeeper"),
        format!("Ask /u/{CONTACT} to join.\n"),
    );
    forum.moderators.insert(MODERATOR.to_string());
    forum
}

#[must_use]
pub fn permalink(id: &str) -> String {
    format!("https://www.reddit.com/r/{SUBREDDIT}/comments/{id}/story/")
}

#[must_use]
pub fn story(id: &str, title: &str, author: &str) -> Submission {
    Submission {
        title: title.to_string(),
        permalink: permalink(id),
        url: String::new(),
        author: author.to_string(),
    }
}

#[must_use]
pub fn comment(id: &str, author: &str, body: &str, created: f64, submission: &Submission) -> Comment {
    Comment {
        id: id.to_string(),
        author: author.to_string(),
        body: body.to_string(),
        created,
        edited: false,
        submission: submission.clone(),
    }
}

#[must_use]
pub fn message(id: &str, author: &str, subject: &str, body: &str) -> Message {
    Message {
        id: id.to_string(),
        author: author.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
        created: 0.0,
    }
}
