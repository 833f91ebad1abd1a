//! Text the bot posts back to requesters.

use crate::config::Config;
use crate::gate::Approved;
use crate::snapshot::ACCEPTED_PAGE;

pub const LOCKED: &str = "This submission is no longer accepting tags";
pub const REMOVALS_DROPPED: &str = "Only the submitter or one of the mods can remove tags! sorry!";
pub const RELOADED: &str = "Settings have been reloaded";
pub const RELOAD_FAILED: &str = "Settings could not be reloaded, the previous settings are still in use";
pub const RELOAD_REFUSED: &str = "Nice try, but you're not a mod ;)";
pub const LOCK_ACCEPTED: &str = "The submission tags can no longer be changed by volunteers";
pub const LOCK_REFUSED: &str = "Only author or mod can lock a thread";

#[must_use]
pub fn not_a_member(contact: &str) -> String {
    format!("You need to contact /u/{contact}  to be able to volunteer tags!")
}

#[must_use]
pub fn foreign_venue(subreddit: &str, other: &str) -> String {
    format!("I can only work on {subreddit}, this is a submission to {other}")
}

#[must_use]
pub fn unresolvable_subject(subject: &str, error: &str) -> String {
    format!(
        "I'm sorry I can't seem to get a submission from url: {subject}\n\nYou will have to try again :(\n\n(Error: {error})"
    )
}

/// Reply for an applied tag request: the removal notice if any, verified
/// additions as wiki links, removed tags, and a pointer to the accepted list.
#[must_use]
pub fn tag_summary(approved: &Approved, config: &Config) -> String {
    let mut parts: Vec<String> = Vec::new();
    if approved.removals_dropped {
        parts.push(REMOVALS_DROPPED.to_string());
    }
    if !approved.request.added.is_empty() {
        let links: Vec<String> = approved
            .request
            .added
            .iter()
            .map(|tag| format!("[{}]({})", tag.display(), config.page_link(tag.display())))
            .collect();
        parts.push(format!("Verified tags: {}", links.join(", ")));
    }
    if !approved.request.removed.is_empty() {
        let names: Vec<&str> = approved.request.removed.iter().map(|t| t.display()).collect();
        parts.push(format!("Removed tags: {}", names.join(", ")));
    }
    parts.push(format!(
        "Accepted list of tags can be found here: {}",
        config.page_link(ACCEPTED_PAGE)
    ));
    parts.join("\n\n")
}
