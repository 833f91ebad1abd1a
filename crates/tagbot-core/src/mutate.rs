//! Applying one add or remove to one tag's index document.

use crate::index::{IndexEntry, parse_index, parse_line, render_index, sort_key_for_title};
use crate::models::Submission;
use crate::tags::{TagName, TagRequest};

/// What to do with a submission on one tag's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOperation {
    Add,
    Remove,
}

/// The index line written for a submission.
#[must_use]
pub fn entry_line(submission: &Submission, subreddit: &str) -> String {
    format!(
        "* [{title}]({permalink}) - by: [{author}](/r/{subreddit}/wiki/{author})",
        title = submission.title.trim(),
        permalink = submission.permalink,
        author = submission.author,
    )
}

/// Produce the new document for `tag` after applying `operation` for
/// `submission` to `current` (the existing page text, empty if absent).
///
/// Removal drops every entry whose sort key equals the key derived from the
/// submission's current title; if the title changed since it was added the
/// removal matches nothing. Adding an already-listed title is a no-op after
/// duplicate collapsing.
#[must_use]
pub fn mutate_index(
    current: &str,
    tag: &TagName,
    submission: &Submission,
    subreddit: &str,
    operation: TagOperation,
) -> String {
    let mut entries: Vec<IndexEntry> = parse_index(current);

    match operation {
        TagOperation::Remove => {
            let key = sort_key_for_title(&submission.title);
            let before = entries.len();
            entries.retain(|entry| entry.sort_key != key);
            tracing::debug!(
                tag = tag.display(),
                title = submission.title.as_str(),
                removed = before - entries.len(),
                "removing submission from index"
            );
        }
        TagOperation::Add => {
            tracing::debug!(
                tag = tag.display(),
                title = submission.title.as_str(),
                "adding submission to index"
            );
            entries.push(parse_line(&entry_line(submission, subreddit)).into_entry());
        }
    }

    render_index(entries, tag.display())
}

/// One mutation per touched tag, additions first. A tag named in both lists
/// is only removed.
#[must_use]
pub fn plan_mutations(request: &TagRequest) -> Vec<(TagName, TagOperation)> {
    request
        .added
        .iter()
        .filter(|tag| !request.removed.iter().any(|r| r.key() == tag.key()))
        .map(|tag| (tag.clone(), TagOperation::Add))
        .chain(
            request
                .removed
                .iter()
                .map(|tag| (tag.clone(), TagOperation::Remove)),
        )
        .collect()
}
