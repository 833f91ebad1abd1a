//! Process configuration for the tag bot
//!
//! Loaded from environment variables with a working-directory `.env` file as
//! fallback. This is the configuration the process starts with; the
//! moderator-editable settings (accepted tags, volunteers, ...) live on wiki
//! pages and are loaded into a [`crate::snapshot::BotConfig`].

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Main configuration struct for the tag bot
#[derive(Clone)]
pub struct Config {
    // Venue
    pub subreddit: String,
    pub wiki_prefix: String,

    // Polling
    pub comment_limit: usize,
    pub poll_interval_seconds: u64,
    pub pacing_seconds: u64,
    /// Delay before retrying a failed configuration load. A failed start
    /// waits this long; a failed reload is retried at the end of the first
    /// cycle that finishes after it has elapsed.
    pub config_retry_seconds: u64,
    pub restart_cooldown_seconds: u64,
    /// Re-read the wiki configuration every N cycles (0 = only on `reload`).
    pub config_refresh_cycles: u64,

    // Commands
    pub tag_command_prefix: String,
    pub lock_command_prefix: String,
    pub reload_subject: String,

    // Storage
    pub data_dir: PathBuf,

    // Credentials
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            subreddit: "HFYBeta".to_string(),
            wiki_prefix: "tags".to_string(),

            comment_limit: 50,
            poll_interval_seconds: 30,
            pacing_seconds: 5,
            config_retry_seconds: 30,
            restart_cooldown_seconds: 140,
            config_refresh_cycles: 5,

            tag_command_prefix: "tags:".to_string(),
            lock_command_prefix: "lock:".to_string(),
            reload_subject: "reload".to_string(),

            data_dir: PathBuf::from("./tagbot-data"),

            username: None,
            password: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Redact secret fields to prevent accidental credential leakage in logs.
        f.debug_struct("Config")
            .field("subreddit", &self.subreddit)
            .field("wiki_prefix", &self.wiki_prefix)
            .field("comment_limit", &self.comment_limit)
            .field("poll_interval_seconds", &self.poll_interval_seconds)
            .field("pacing_seconds", &self.pacing_seconds)
            .field("config_retry_seconds", &self.config_retry_seconds)
            .field("restart_cooldown_seconds", &self.restart_cooldown_seconds)
            .field("config_refresh_cycles", &self.config_refresh_cycles)
            .field("data_dir", &self.data_dir)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Venue
        if let Some(v) = env_value("TAGBOT_SUBREDDIT") {
            let trimmed = v.trim().trim_start_matches("/r/").trim_matches('/');
            if !trimmed.is_empty() {
                config.subreddit = trimmed.to_string();
            }
        }
        if let Some(v) = env_value("TAGBOT_WIKI_PREFIX") {
            let trimmed = v.trim().trim_matches('/');
            if !trimmed.is_empty() {
                config.wiki_prefix = trimmed.to_string();
            }
        }

        // Polling
        config.comment_limit = env_usize("TAGBOT_COMMENT_LIMIT", config.comment_limit).max(1);
        config.poll_interval_seconds =
            env_u64("TAGBOT_POLL_INTERVAL_SECONDS", config.poll_interval_seconds);
        config.pacing_seconds = env_u64("TAGBOT_PACING_SECONDS", config.pacing_seconds);
        config.config_retry_seconds =
            env_u64("TAGBOT_CONFIG_RETRY_SECONDS", config.config_retry_seconds);
        config.restart_cooldown_seconds = env_u64(
            "TAGBOT_RESTART_COOLDOWN_SECONDS",
            config.restart_cooldown_seconds,
        );
        config.config_refresh_cycles =
            env_u64("TAGBOT_CONFIG_REFRESH_CYCLES", config.config_refresh_cycles);

        // Storage
        if let Some(v) = env_value("TAGBOT_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(v.trim());
        }

        // Credentials
        config.username = env_value("TAGBOT_USERNAME").filter(|v| !v.trim().is_empty());
        config.password = env_value("TAGBOT_PASSWORD").filter(|v| !v.is_empty());

        config
    }

    /// Full page name for `page` under the configured wiki prefix.
    #[must_use]
    pub fn page_name(&self, page: &str) -> String {
        format!("{}/{page}", self.wiki_prefix)
    }

    /// Link to a page under the wiki prefix, as rendered in replies.
    #[must_use]
    pub fn page_link(&self, page: &str) -> String {
        format!("/r/{}/wiki/{}/{page}", self.subreddit, self.wiki_prefix)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    #[must_use]
    pub const fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_seconds)
    }

    #[must_use]
    pub const fn config_retry_delay(&self) -> Duration {
        Duration::from_secs(self.config_retry_seconds)
    }

    #[must_use]
    pub const fn restart_cooldown(&self) -> Duration {
        Duration::from_secs(self.restart_cooldown_seconds)
    }
}

// Helper functions for environment variable parsing

static DOTENV_VALUES: OnceLock<HashMap<String, String>> = OnceLock::new();

#[cfg(test)]
thread_local! {
    static TEST_ENV_OVERRIDES: std::cell::RefCell<HashMap<String, String>> =
        std::cell::RefCell::new(HashMap::new());
}

#[cfg(test)]
fn test_env_override_value(key: &str) -> Option<String> {
    TEST_ENV_OVERRIDES.with(|cell| cell.borrow().get(key).cloned())
}

fn dotenv_values() -> &'static HashMap<String, String> {
    DOTENV_VALUES.get_or_init(|| load_dotenv_file(Path::new(".env")))
}

/// Read a value from the working-directory `.env` file.
#[must_use]
pub fn dotenv_value(key: &str) -> Option<String> {
    dotenv_values().get(key).cloned()
}

/// Read a value from the real environment first, falling back to .env.
#[must_use]
pub fn env_value(key: &str) -> Option<String> {
    #[cfg(test)]
    if let Some(v) = test_env_override_value(key) {
        return Some(v);
    }
    env::var(key).ok().or_else(|| dotenv_value(key))
}

fn load_dotenv_file(path: &Path) -> HashMap<String, String> {
    let Ok(contents) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    parse_dotenv_contents(&contents)
}

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments.
///
/// Accepts an optional `export ` prefix and single or double quotes around
/// the value; unquoted values lose any trailing ` # comment`.
#[must_use]
pub fn parse_dotenv_contents(contents: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), parse_dotenv_value(raw.trim()));
    }
    out
}

fn parse_dotenv_value(raw: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = raw.strip_prefix(quote)
            && let Some(end) = inner.find(quote)
        {
            return inner[..end].to_string();
        }
    }
    raw.find(" #")
        .map_or(raw, |idx| &raw[..idx])
        .trim_end()
        .to_string()
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    let Some(raw) = env_value(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = raw.as_str(), "ignoring unparsable setting");
        default
    })
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_parsed(key, default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_parsed(key, default)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestEnvOverrideGuard {
        previous: Vec<(String, Option<String>)>,
    }

    impl TestEnvOverrideGuard {
        fn set(vars: &[(&str, &str)]) -> Self {
            let mut previous = Vec::new();
            TEST_ENV_OVERRIDES.with(|cell| {
                let mut map = cell.borrow_mut();
                for (key, value) in vars {
                    let old = map.get(*key).cloned();
                    previous.push(((*key).to_string(), old));
                    map.insert((*key).to_string(), (*value).to_string());
                }
            });
            Self { previous }
        }
    }

    impl Drop for TestEnvOverrideGuard {
        fn drop(&mut self) {
            TEST_ENV_OVERRIDES.with(|cell| {
                let mut map = cell.borrow_mut();
                for (key, value) in self.previous.drain(..) {
                    match value {
                        Some(v) => {
                            map.insert(key, v);
                        }
                        None => {
                            map.remove(&key);
                        }
                    }
                }
            });
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.subreddit, "HFYBeta");
        assert_eq!(config.wiki_prefix, "tags");
        assert_eq!(config.comment_limit, 50);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.pacing(), Duration::from_secs(5));
        assert_eq!(config.restart_cooldown(), Duration::from_secs(140));
        assert_eq!(config.tag_command_prefix, "tags:");
    }

    #[test]
    fn test_from_env_overrides() {
        let _guard = TestEnvOverrideGuard::set(&[
            ("TAGBOT_SUBREDDIT", "/r/HFY/"),
            ("TAGBOT_WIKI_PREFIX", "/index/"),
            ("TAGBOT_COMMENT_LIMIT", "0"),
            ("TAGBOT_PACING_SECONDS", "0"),
            ("TAGBOT_CONFIG_REFRESH_CYCLES", "not-a-number"),
        ]);
        let config = Config::from_env();
        assert_eq!(config.subreddit, "HFY");
        assert_eq!(config.wiki_prefix, "index");
        assert_eq!(config.comment_limit, 1, "limit is clamped to at least one");
        assert_eq!(config.pacing_seconds, 0);
        assert_eq!(config.config_refresh_cycles, 5, "garbage keeps the default");
    }

    #[test]
    fn test_page_names_and_links() {
        let config = Config::default();
        assert_eq!(config.page_name("Oc"), "tags/Oc");
        assert_eq!(
            config.page_link("accepted"),
            "/r/HFYBeta/wiki/tags/accepted"
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let _guard = TestEnvOverrideGuard::set(&[
            ("TAGBOT_USERNAME", "HFY_tag_bot"),
            ("TAGBOT_PASSWORD", "hunter2hunter2"),
        ]);
        let rendered = format!("{:?}", Config::from_env());
        assert!(rendered.contains("HFY_tag_bot"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_parse_dotenv_contents() {
        let parsed = parse_dotenv_contents(
            "# comment\nexport TAGBOT_SUBREDDIT=HFY\nTAGBOT_DATA_DIR=\"/var/lib/tag bot\"\n\
             TAGBOT_PACING_SECONDS=2 # slow down\nnot a pair\n",
        );
        assert_eq!(parsed.get("TAGBOT_SUBREDDIT").map(String::as_str), Some("HFY"));
        assert_eq!(
            parsed.get("TAGBOT_DATA_DIR").map(String::as_str),
            Some("/var/lib/tag bot")
        );
        assert_eq!(
            parsed.get("TAGBOT_PACING_SECONDS").map(String::as_str),
            Some("2")
        );
        assert_eq!(parsed.len(), 3);
    }
}
