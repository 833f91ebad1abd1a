#![forbid(unsafe_code)]
//! Directory-backed forum store for the tag bot.
//!
//! [`FsForum`] implements [`tagbot_core::Forum`] over a plain directory so
//! the bot can run offline, against fixtures, or behind any process that
//! syncs the directory with the real platform:
//!
//! ```text
//! <root>/
//!   wiki/<prefix>/<Page>.md   wiki pages
//!   comments.json             recent comment feed
//!   submissions.json          known submissions
//!   moderators.json           moderator identities
//!   inbox/<id>.json           unread messages
//!   inbox/read/<id>.json      consumed messages
//!   outbox.jsonl              posted replies, one JSON object per line
//!   .tagbot.lock              advisory lock held around every mutation
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use thiserror::Error;

use tagbot_core::{Comment, Forum, Message, ReplyTarget, Submission};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock acquisition timed out: {0}")]
    LockTimeout(String),

    #[error("Invalid page name: {0}")]
    InvalidPageName(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl From<StorageError> for tagbot_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => Self::Io(e),
            StorageError::Json(e) => Self::Serialization(e),
            StorageError::InvalidPageName(name) => Self::InvalidArgument(name),
            StorageError::LockTimeout(msg) => Self::Platform(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

/// One posted reply, as appended to `outbox.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub target: ReplyTarget,
    pub text: String,
    /// RFC 3339 time the reply was recorded.
    pub posted_at: String,
}

// ---------------------------------------------------------------------------
// Advisory lock
// ---------------------------------------------------------------------------

/// Exclusive advisory lock on a file, released when dropped.
#[derive(Debug)]
pub struct DirLock {
    file: fs::File,
}

impl DirLock {
    /// Acquire the lock, retrying with backoff until `timeout`.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        use fs2::FileExt;

        ensure_parent_dir(path)?;
        let start = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            let file = fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(path)?;
            if file.try_lock_exclusive().is_ok() {
                return Ok(Self { file });
            }
            if start.elapsed() >= timeout {
                return Err(StorageError::LockTimeout(format!(
                    "Timed out acquiring lock {} after {:.2}s ({} attempts)",
                    path.display(),
                    start.elapsed().as_secs_f64(),
                    attempt + 1
                )));
            }
            let sleep_ms = 25 * u64::from(1u32 << attempt.min(4));
            std::thread::sleep(Duration::from_millis(sleep_ms));
            attempt += 1;
        }
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        use fs2::FileExt;
        if let Err(e) = self.file.unlock() {
            tracing::warn!(error = %e, "failed to release store lock");
        }
    }
}

// ---------------------------------------------------------------------------
// FsForum
// ---------------------------------------------------------------------------

const LOCK_FILE: &str = ".tagbot.lock";
const COMMENTS_FILE: &str = "comments.json";
const SUBMISSIONS_FILE: &str = "submissions.json";
const MODERATORS_FILE: &str = "moderators.json";
const OUTBOX_FILE: &str = "outbox.jsonl";

/// A forum whose state lives in a directory.
#[derive(Debug, Clone)]
pub struct FsForum {
    root: PathBuf,
    lock_timeout: Duration,
}

impl FsForum {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("wiki"))?;
        fs::create_dir_all(root.join("inbox").join("read"))?;
        tracing::debug!(root = %root.display(), "opened directory store");
        Ok(Self {
            root,
            lock_timeout: Duration::from_secs(10),
        })
    }

    /// Configure how long mutations wait for the store lock.
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path backing wiki page `name` (e.g. `tags/Oc` -> `wiki/tags/Oc.md`).
    pub fn page_path(&self, name: &str) -> Result<PathBuf> {
        validate_page_name(name)?;
        let mut path = self.root.join("wiki");
        for segment in name.split('/') {
            path.push(segment);
        }
        path.set_extension("md");
        Ok(path)
    }

    fn lock(&self) -> Result<DirLock> {
        DirLock::acquire(&self.root.join(LOCK_FILE), self.lock_timeout)
    }

    // -- Page store ---------------------------------------------------------

    pub fn load_page(&self, name: &str) -> Result<Option<String>> {
        let path = self.page_path(name)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn store_page(&self, name: &str, text: &str) -> Result<()> {
        let path = self.page_path(name)?;
        let _guard = self.lock()?;
        ensure_parent_dir(&path)?;
        atomic_write_bytes(&path, text.as_bytes())?;
        tracing::debug!(page = name, bytes = text.len(), "stored wiki page");
        Ok(())
    }

    // -- Feeds --------------------------------------------------------------

    /// Comment feed, newest first, at most `limit`.
    pub fn load_comments(&self, limit: usize) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = read_json_or_default(&self.root.join(COMMENTS_FILE))?;
        comments.sort_by(|a, b| b.created.total_cmp(&a.created));
        comments.truncate(limit);
        Ok(comments)
    }

    pub fn save_comments(&self, comments: &[Comment]) -> Result<()> {
        self.write_json(COMMENTS_FILE, &comments)
    }

    pub fn load_submissions(&self) -> Result<Vec<Submission>> {
        read_json_or_default(&self.root.join(SUBMISSIONS_FILE))
    }

    pub fn save_submissions(&self, submissions: &[Submission]) -> Result<()> {
        self.write_json(SUBMISSIONS_FILE, &submissions)
    }

    pub fn load_moderators(&self) -> Result<BTreeSet<String>> {
        read_json_or_default(&self.root.join(MODERATORS_FILE))
    }

    pub fn save_moderators(&self, moderators: &BTreeSet<String>) -> Result<()> {
        self.write_json(MODERATORS_FILE, moderators)
    }

    /// Find a submission by permalink or link URL, ignoring a trailing `/`.
    pub fn find_submission(&self, url: &str) -> Result<Option<Submission>> {
        let wanted = url.trim().trim_end_matches('/');
        if wanted.is_empty() {
            return Ok(None);
        }
        Ok(self.load_submissions()?.into_iter().find(|s| {
            s.permalink.trim_end_matches('/') == wanted
                || (!s.url.is_empty() && s.url.trim_end_matches('/') == wanted)
        }))
    }

    // -- Inbox / outbox -----------------------------------------------------

    /// Drop a message into the inbox as `inbox/<id>.json`.
    pub fn deliver(&self, message: &Message) -> Result<()> {
        let path = self.inbox_path(&message.id)?;
        let _guard = self.lock()?;
        atomic_write_bytes(&path, &serde_json::to_vec_pretty(message)?)
    }

    /// Unread messages, oldest first. Unparseable files are skipped.
    pub fn load_unread(&self) -> Result<Vec<Message>> {
        let dir = self.root.join("inbox");
        let mut messages = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = fs::read(&path)?;
            match serde_json::from_slice::<Message>(&bytes) {
                Ok(mut message) => {
                    message.id = stem.to_string();
                    messages.push(message);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable inbox file");
                }
            }
        }
        messages.sort_by(|a, b| a.created.total_cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(messages)
    }

    /// Move a message to `inbox/read/`. Already-read messages are left alone.
    pub fn consume(&self, id: &str) -> Result<()> {
        let from = self.inbox_path(id)?;
        let to = self.root.join("inbox").join("read").join(format!("{id}.json"));
        let _guard = self.lock()?;
        match fs::rename(&from, &to) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(id, "message already consumed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Append a reply to the outbox.
    pub fn post(&self, target: &ReplyTarget, text: &str) -> Result<()> {
        let entry = OutboxEntry {
            target: target.clone(),
            text: text.to_string(),
            posted_at: Utc::now().to_rfc3339(),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        let _guard = self.lock()?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(OUTBOX_FILE))?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    /// Every reply posted so far, in order.
    pub fn outbox(&self) -> Result<Vec<OutboxEntry>> {
        let path = self.root.join(OUTBOX_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StorageError::from))
            .collect()
    }

    fn inbox_path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(StorageError::InvalidPageName(format!("message id {id:?}")));
        }
        Ok(self.root.join("inbox").join(format!("{id}.json")))
    }

    fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        let _guard = self.lock()?;
        atomic_write_bytes(&self.root.join(file), &serde_json::to_vec_pretty(value)?)
    }
}

impl Forum for FsForum {
    fn read_page(&mut self, name: &str) -> tagbot_core::Result<Option<String>> {
        Ok(self.load_page(name)?)
    }

    fn write_page(&mut self, name: &str, text: &str) -> tagbot_core::Result<()> {
        Ok(self.store_page(name, text)?)
    }

    fn recent_comments(&mut self, limit: usize) -> tagbot_core::Result<Vec<Comment>> {
        Ok(self.load_comments(limit)?)
    }

    fn unread_messages(&mut self) -> tagbot_core::Result<Vec<Message>> {
        Ok(self.load_unread()?)
    }

    fn reply(&mut self, target: &ReplyTarget, text: &str) -> tagbot_core::Result<()> {
        Ok(self.post(target, text)?)
    }

    fn mark_read(&mut self, message: &Message) -> tagbot_core::Result<()> {
        Ok(self.consume(&message.id)?)
    }

    fn moderators(&mut self) -> tagbot_core::Result<BTreeSet<String>> {
        Ok(self.load_moderators()?)
    }

    fn submission(&mut self, url: &str) -> tagbot_core::Result<Option<Submission>> {
        Ok(self.find_submission(url)?)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Page names are `/`-separated segments; none may be empty, `.`, `..`, or
/// contain a backslash or NUL.
fn validate_page_name(name: &str) -> Result<()> {
    let bad_segment = name
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == ".." || seg.contains(['\\', '\0']));
    if name.is_empty() || bad_segment {
        return Err(StorageError::InvalidPageName(name.to_string()));
    }
    Ok(())
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write bytes to a file atomically via a temp file + rename.
///
/// The temp file is created in the same directory as the target so that
/// `fs::rename` stays on one filesystem.
fn atomic_write_bytes(path: &Path, data: &[u8]) -> Result<()> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        ".tmp-{}-{seq}-{}",
        std::process::id(),
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    let tmp_path = parent.join(tmp_name);
    let mut f = fs::File::create(&tmp_path)?;
    f.write_all(data)?;
    f.sync_data()?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        e.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_names_map_under_wiki() {
        let dir = tempfile::tempdir().expect("tempdir");
        let forum = FsForum::open(dir.path()).expect("open");
        let path = forum.page_path("tags/J-Verse").expect("path");
        assert_eq!(path, dir.path().join("wiki").join("tags").join("J-Verse.md"));
    }

    #[test]
    fn rejects_escaping_page_names() {
        for bad in ["", "tags/../secret", "/etc/passwd", "tags//Oc", "tags\\Oc", "./x"] {
            assert!(
                matches!(validate_page_name(bad), Err(StorageError::InvalidPageName(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(validate_page_name("tags/last_seen").is_ok());
    }

    #[test]
    fn storage_errors_convert_to_core_errors() {
        let err: tagbot_core::Error = StorageError::LockTimeout("busy".into()).into();
        assert_eq!(err.error_type(), "PLATFORM_ERROR");
        let err: tagbot_core::Error = StorageError::InvalidPageName("..".into()).into();
        assert_eq!(err.error_type(), "INVALID_ARGUMENT");
    }

    #[test]
    fn atomic_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("page.md");
        atomic_write_bytes(&target, b"one").expect("write");
        atomic_write_bytes(&target, b"two").expect("overwrite");
        assert_eq!(fs::read_to_string(&target).expect("read"), "two");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("list")
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn lock_times_out_while_held() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(LOCK_FILE);
        let _held = DirLock::acquire(&path, Duration::from_millis(50)).expect("first lock");
        let second = DirLock::acquire(&path, Duration::from_millis(60));
        assert!(matches!(second, Err(StorageError::LockTimeout(_))));
    }
}
