// Trait abstractions for the polling loop's external collaborators.
//
// ContentSource — the forum API behind one trait. Authentication,
//   pagination, and rate-limit handling live in the implementation.
// TextSplitter — tokenization for the term matcher.
// TextClassifier — reserved scoring stage, not wired into flagging.
//
// These enable deterministic testing with MockSource: no network,
// no credentials.

use anyhow::Result;
use async_trait::async_trait;

use termwatch_common::{Post, Reply};

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch up to `limit` most-recent top-level posts from a named source.
    async fn recent_posts(&self, source_name: &str, limit: u32) -> Result<Vec<Post>>;

    /// Fetch a post's full reply tree, flattened. Implementations must
    /// materialize any "load more" continuation placeholders before
    /// returning — the scanner iterates what it gets and never pages.
    async fn replies(&self, post: &Post) -> Result<Vec<Reply>>;
}

pub trait TextSplitter: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Reserved scoring stage for a future classification model. Declared so
/// a scoring pass can be added without reshaping the polling loop;
/// flagging is currently term-match-only.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn score(&self, text: &str) -> Result<String>;
}
