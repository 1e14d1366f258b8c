use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use termwatch_common::{FlaggedItem, ItemKind, TermWatchError, WriteMode};

/// Separator/banner line, 62 characters wide.
const BANNER: &str = "##############################################################";

/// Serializes the accumulated set to a flat-text report file.
/// Write failures are surfaced to the caller, never retried.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `items` in admission order, posts sectioned before replies.
    pub fn write(&self, items: &[FlaggedItem], mode: WriteMode) -> Result<(), TermWatchError> {
        let rendered = render(items);
        self.persist(&rendered, mode).map_err(|e| TermWatchError::OutputWrite {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        info!(
            path = %self.path.display(),
            items = items.len(),
            mode = ?mode,
            "Report written"
        );
        Ok(())
    }

    fn persist(&self, rendered: &str, mode: WriteMode) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        match mode {
            WriteMode::Overwrite => fs::write(&self.path, rendered),
            WriteMode::Append => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                file.write_all(rendered.as_bytes())
            }
        }
    }
}

fn render(items: &[FlaggedItem]) -> String {
    let mut out = String::new();

    let posts: Vec<&FlaggedItem> = items.iter().filter(|i| i.kind == ItemKind::Post).collect();
    let replies: Vec<&FlaggedItem> = items.iter().filter(|i| i.kind == ItemKind::Reply).collect();

    if !posts.is_empty() {
        section(&mut out, "Submissions", &posts);
    }
    if !replies.is_empty() {
        section(&mut out, "Comments", &replies);
    }
    out
}

fn section(out: &mut String, title: &str, items: &[&FlaggedItem]) {
    out.push_str(BANNER);
    out.push('\n');
    out.push_str(&format!("# {title:<59}#\n"));
    out.push_str(BANNER);
    out.push('\n');

    for item in items {
        out.push_str(&format!("Author: /u/{}\n", item.author));
        out.push_str(&format!("Text: {}\n", item.text));
        out.push_str(&format!("Subreddit: /r/{}\n", item.source_name));
        out.push_str(&format!("URL:{}\n", item.url));
        out.push_str(BANNER);
        out.push('\n');
    }
}
