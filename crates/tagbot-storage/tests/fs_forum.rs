//! `FsForum` behaviour through the `Forum` trait.

use std::collections::BTreeSet;

use tagbot_core::{Comment, Forum, Message, ReplyTarget, Submission};
use tagbot_storage::FsForum;

fn story(id: &str) -> Submission {
    Submission {
        title: format!("Story {id}"),
        permalink: format!("https://www.reddit.com/r/HFYBeta/comments/{id}/story/"),
        url: format!("https://i.example.com/{id}.png"),
        author: "writer".into(),
    }
}

fn comment(id: &str, created: f64) -> Comment {
    Comment {
        id: id.into(),
        author: "helper".into(),
        body: "tags: oc".into(),
        created,
        edited: false,
        submission: story("s1"),
    }
}

fn message(id: &str, created: f64) -> Message {
    Message {
        id: id.into(),
        author: "writer".into(),
        subject: "reload".into(),
        body: String::new(),
        created,
    }
}

#[test]
fn pages_round_trip_and_absent_is_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut forum = FsForum::open(dir.path()).expect("open");

    assert_eq!(forum.read_page("tags/Oc").expect("read"), None);
    forum.write_page("tags/Oc", "#Oc\n\n").expect("write");
    assert_eq!(forum.read_page("tags/Oc").expect("read").as_deref(), Some("#Oc\n\n"));
    forum.write_page("tags/Oc", "#Oc\n\n\n\n##A\n\n").expect("overwrite");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("wiki/tags/Oc.md")).expect("on disk"),
        "#Oc\n\n\n\n##A\n\n"
    );
}

#[test]
fn invalid_page_name_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut forum = FsForum::open(dir.path()).expect("open");
    let err = forum.write_page("tags/../../escape", "x").expect_err("rejected");
    assert_eq!(err.error_type(), "INVALID_ARGUMENT");
}

#[test]
fn comment_feed_is_newest_first_and_bounded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut forum = FsForum::open(dir.path()).expect("open");
    forum
        .save_comments(&[comment("a", 10.0), comment("b", 7.0), comment("c", 15.0)])
        .expect("seed");

    let feed = forum.recent_comments(2).expect("feed");
    let ids: Vec<&str> = feed.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a"]);
}

#[test]
fn missing_feeds_are_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut forum = FsForum::open(dir.path()).expect("open");
    assert!(forum.recent_comments(50).expect("feed").is_empty());
    assert!(forum.moderators().expect("mods").is_empty());
    assert!(forum.unread_messages().expect("inbox").is_empty());
}

#[test]
fn inbox_messages_move_to_read_once_consumed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut forum = FsForum::open(dir.path()).expect("open");
    forum.deliver(&message("m2", 2.0)).expect("deliver");
    forum.deliver(&message("m1", 1.0)).expect("deliver");
    std::fs::write(dir.path().join("inbox/junk.json"), "{ not json").expect("junk");

    let unread = forum.unread_messages().expect("inbox");
    let ids: Vec<&str> = unread.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2"]);

    forum.mark_read(&unread[0]).expect("mark");
    forum.mark_read(&unread[0]).expect("second mark is harmless");
    assert!(dir.path().join("inbox/read/m1.json").exists());
    let unread = forum.unread_messages().expect("inbox");
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].id, "m2");
}

#[test]
fn replies_append_to_outbox() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut forum = FsForum::open(dir.path()).expect("open");
    forum
        .reply(&ReplyTarget::Comment("c1".into()), "Verified tags: [Oc](x)")
        .expect("reply");
    forum
        .reply(&ReplyTarget::Message("m1".into()), "Settings have been reloaded")
        .expect("reply");

    let outbox = forum.outbox().expect("outbox");
    assert_eq!(outbox.len(), 2);
    assert_eq!(outbox[0].target, ReplyTarget::Comment("c1".into()));
    assert_eq!(outbox[1].text, "Settings have been reloaded");
    assert!(!outbox[1].posted_at.is_empty());
}

#[test]
fn submissions_resolve_by_permalink_or_url() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut forum = FsForum::open(dir.path()).expect("open");
    let s = story("s1");
    forum.save_submissions(std::slice::from_ref(&s)).expect("seed");

    let by_permalink = s.permalink.trim_end_matches('/').to_string();
    assert_eq!(forum.submission(&by_permalink).expect("lookup"), Some(s.clone()));
    assert_eq!(forum.submission(&s.url).expect("lookup"), Some(s));
    assert_eq!(forum.submission("https://nowhere/").expect("lookup"), None);
    assert_eq!(forum.submission("  ").expect("lookup"), None);
}

#[test]
fn moderators_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut forum = FsForum::open(dir.path()).expect("open");
    let mods = BTreeSet::from(["modperson".to_string(), "other".to_string()]);
    forum.save_moderators(&mods).expect("seed");
    assert_eq!(forum.moderators().expect("mods"), mods);
}
