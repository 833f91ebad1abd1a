//! A full cycle over the directory-backed store, paced with a recorder.

use std::collections::BTreeSet;
use std::time::Duration;

use tagbot_core::{Forum, ReplyTarget, replies};
use tagbot_dispatch::{Paced, Pause, TagBot};
use tagbot_storage::FsForum;
use tagbot_test_helpers::fixtures;

#[derive(Default)]
struct Recorder(usize);

impl Pause for Recorder {
    fn pause(&mut self, _duration: Duration) {
        self.0 += 1;
    }
}

fn seed(forum: &mut FsForum) {
    let config = fixtures::config();
    forum
        .write_page(&config.page_name("accepted"), "* [OC]\n* [PI]\n* [NSFW]\n")
        .expect("accepted");
    forum
        .write_page(&config.page_name("volunteers"), "/u/helper\n")
        .expect("volunteers");
    forum
        .write_page(&config.page_name("codexkeeper"), "/u/Keeper\n")
        .expect("contact");
    forum
        .save_moderators(&BTreeSet::from([fixtures::MODERATOR.to_string()]))
        .expect("moderators");
}

#[test]
fn comment_and_lock_message_round_trip_through_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = FsForum::open(dir.path()).expect("open");
    seed(&mut store);

    let story = fixtures::story("s1", "[OC] First Contact", "writer");
    store.save_submissions(&[story.clone()]).expect("submissions");
    store
        .save_comments(&[
            fixtures::comment("c1", fixtures::VOLUNTEER, "tags: oc pi", 100.0, &story),
            fixtures::comment("c2", "stranger", "tags: nsfw", 101.0, &story),
        ])
        .expect("comments");
    store
        .deliver(&fixtures::message("m1", "writer", &story.permalink, "lock:"))
        .expect("deliver");

    let mut recorder = Recorder::default();
    let paced = Paced::with_pause(store.clone(), Duration::from_secs(5), &mut recorder);
    let mut bot = TagBot::start(paced, fixtures::config()).expect("start");
    let report = bot.run_cycle().expect("cycle");
    drop(bot);

    assert_eq!(report.comments_handled, 2);
    assert_eq!(report.messages_handled, 1);
    assert!(recorder.0 > 0, "every platform call is paced");

    let oc = store.load_page("tags/Oc").expect("read").expect("oc page");
    assert!(oc.starts_with("#Oc\n\n\n\n##F\n\n* [First Contact]("));
    assert!(store.load_page("tags/Pi").expect("read").is_some());
    assert_eq!(store.load_page("tags/Nsfw").expect("read"), None);
    assert_eq!(
        store.load_page("tags/last_seen").expect("read").as_deref(),
        Some("101")
    );
    assert_eq!(
        store.load_page("tags/locked").expect("read"),
        Some(format!("* {}\n\n", story.permalink))
    );

    let outbox = store.outbox().expect("outbox");
    let to_stranger: Vec<&str> = outbox
        .iter()
        .filter(|e| e.target == ReplyTarget::Comment("c2".into()))
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(to_stranger, vec![replies::not_a_member("Keeper").as_str()]);
    assert!(
        outbox
            .iter()
            .any(|e| e.target == ReplyTarget::Message("m1".into()) && e.text == replies::LOCK_ACCEPTED)
    );
    assert!(store.load_unread().expect("inbox").is_empty());
    assert!(dir.path().join("inbox/read/m1.json").exists());
}

#[test]
fn second_cycle_does_not_reprocess() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = FsForum::open(dir.path()).expect("open");
    seed(&mut store);
    let story = fixtures::story("s1", "Alpha", "writer");
    store
        .save_comments(&[fixtures::comment("c1", fixtures::VOLUNTEER, "tags: oc", 50.0, &story)])
        .expect("comments");

    let mut bot = TagBot::start(store.clone(), fixtures::config()).expect("start");
    assert_eq!(bot.run_cycle().expect("first").comments_handled, 1);
    assert_eq!(bot.run_cycle().expect("second").comments_handled, 0);
    assert_eq!(store.outbox().expect("outbox").len(), 1);
}
