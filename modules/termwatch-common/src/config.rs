use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::types::Watchlist;

/// Which sources a polling cycle covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Every source each cycle, the per-source bound split evenly.
    AllSources,
    /// One source per cycle, wrapping.
    RoundRobin,
}

/// When accumulated items are persisted to the report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Write the whole set once when the run terminates. Unflushed data
    /// is lost if the process dies first.
    AtEnd,
    /// Append each cycle's newly admitted items, bounding loss to one
    /// cycle's worth.
    PerCycle,
}

/// How the first write to the report file treats existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Overwrite,
    Append,
}

/// Application configuration: credentials and lists from the settings
/// directory, tunables from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Source credentials (opaque, contents not interpreted)
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,

    // Flagging inputs
    pub watchlist: Watchlist,
    pub sources: Vec<String>,

    // Output
    pub output_path: PathBuf,
    pub write_mode: WriteMode,
    pub flush_policy: FlushPolicy,

    // Pacing and termination
    pub scan_mode: ScanMode,
    pub desired_entries: usize,
    pub posts_per_minute: u32,
    pub posts_per_source: u32,
    pub total_post_limit: u32,
    /// Fixed cooldown between cycles. When unset the cycle period is
    /// rate-paced from posts_per_minute.
    pub cooldown_secs: Option<u64>,
}

impl Config {
    /// Load configuration. A missing settings file degrades to an empty
    /// string/list rather than a startup failure; malformed numeric env
    /// vars panic with a clear message.
    pub fn load() -> Self {
        let settings_dir =
            PathBuf::from(env::var("SETTINGS_DIR").unwrap_or_else(|_| "settings".to_string()));

        Self {
            client_id: read_setting(&settings_dir, "id"),
            client_secret: read_setting(&settings_dir, "secret"),
            user_agent: read_setting(&settings_dir, "user_agent"),
            watchlist: Watchlist::parse(&read_setting(&settings_dir, "term_list")),
            sources: parse_list(&read_setting(&settings_dir, "subreddit_list")),
            output_path: PathBuf::from(
                env::var("OUTPUT_PATH").unwrap_or_else(|_| "output/flagged.txt".to_string()),
            ),
            write_mode: match env::var("WRITE_MODE").as_deref() {
                Ok("append") => WriteMode::Append,
                _ => WriteMode::Overwrite,
            },
            flush_policy: match env::var("FLUSH_POLICY").as_deref() {
                Ok("at_end") => FlushPolicy::AtEnd,
                _ => FlushPolicy::PerCycle,
            },
            scan_mode: match env::var("SCAN_MODE").as_deref() {
                Ok("all_sources") => ScanMode::AllSources,
                _ => ScanMode::RoundRobin,
            },
            desired_entries: numeric_env("DESIRED_ENTRIES", 10_000),
            posts_per_minute: numeric_env("POSTS_PER_MINUTE", 80),
            posts_per_source: numeric_env("POSTS_PER_SOURCE", 200),
            total_post_limit: numeric_env("TOTAL_POST_LIMIT", 1_000),
            cooldown_secs: env::var("COOLDOWN_SECS")
                .ok()
                .map(|v| v.parse().expect("COOLDOWN_SECS must be a number")),
        }
    }

    /// Log the loaded configuration without exposing credentials.
    pub fn log_redacted(&self) {
        info!(
            sources = self.sources.len(),
            terms = self.watchlist.len(),
            scan_mode = ?self.scan_mode,
            flush_policy = ?self.flush_policy,
            desired_entries = self.desired_entries,
            output = %self.output_path.display(),
            has_credentials = !self.client_id.is_empty(),
            "Configuration loaded"
        );
    }
}

/// Read one settings file; a missing file yields an empty string.
fn read_setting(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Parse a comma-separated list, dropping empty entries.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn numeric_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
