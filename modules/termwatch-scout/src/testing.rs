// Test mocks for the polling pipeline.
//
// MockSource implements ContentSource over in-memory maps: no network,
// no credentials. Builder pattern: `.on_posts()`, `.on_replies()`,
// `.failing()`. Repeated `.on_posts()` for one source queues batches so
// consecutive cycles can see different data; the last batch sticks.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use termwatch_common::{FlaggedItem, ItemKind, ParentRef, Post, Reply};

use crate::traits::ContentSource;

pub struct MockSource {
    posts: Mutex<HashMap<String, VecDeque<Vec<Post>>>>,
    replies: HashMap<String, Vec<Reply>>,
    failing: HashSet<String>,
    failing_replies: HashSet<String>,
    calls: Arc<Mutex<Vec<(String, u32)>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            posts: Mutex::new(HashMap::new()),
            replies: HashMap::new(),
            failing: HashSet::new(),
            failing_replies: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a batch of posts for a source. Unregistered sources fetch
    /// empty; registered ones serve queued batches in order, repeating
    /// the last one once the queue is drained.
    pub fn on_posts(self, source_name: &str, posts: Vec<Post>) -> Self {
        self.posts
            .lock()
            .unwrap()
            .entry(source_name.to_string())
            .or_default()
            .push_back(posts);
        self
    }

    pub fn on_replies(mut self, post_id: &str, replies: Vec<Reply>) -> Self {
        self.replies.insert(post_id.to_string(), replies);
        self
    }

    /// Make `recent_posts` fail for this source name.
    pub fn failing(mut self, source_name: &str) -> Self {
        self.failing.insert(source_name.to_string());
        self
    }

    /// Make `replies` fail for this post id.
    pub fn failing_replies(mut self, post_id: &str) -> Self {
        self.failing_replies.insert(post_id.to_string());
        self
    }

    /// Handle onto the `(source_name, limit)` fetch record, usable after
    /// the mock has been moved into a scanner.
    pub fn calls(&self) -> Arc<Mutex<Vec<(String, u32)>>> {
        Arc::clone(&self.calls)
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn recent_posts(&self, source_name: &str, limit: u32) -> Result<Vec<Post>> {
        self.calls
            .lock()
            .unwrap()
            .push((source_name.to_string(), limit));

        if self.failing.contains(source_name) {
            bail!("MockSource: fetch failed for {source_name}");
        }

        let mut queues = self.posts.lock().unwrap();
        let batch = match queues.get_mut(source_name) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => Vec::new(),
        };
        Ok(batch.into_iter().take(limit as usize).collect())
    }

    async fn replies(&self, post: &Post) -> Result<Vec<Reply>> {
        if self.failing_replies.contains(&post.id) {
            bail!("MockSource: reply fetch failed for {}", post.id);
        }
        Ok(self.replies.get(&post.id).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

pub fn post(id: &str, source_name: &str, title: &str, body: &str) -> Post {
    Post {
        id: id.to_string(),
        author: "tester".to_string(),
        title: title.to_string(),
        body: body.to_string(),
        source_name: source_name.to_string(),
        url: format!("https://example.com/r/{source_name}/{id}"),
    }
}

/// A reply whose parent is another reply.
pub fn reply(id: &str, body: &str, parent_reply_id: &str) -> Reply {
    Reply {
        id: id.to_string(),
        author: "tester".to_string(),
        body: body.to_string(),
        url: format!("https://example.com/r/test/{id}"),
        parent: ParentRef::Reply(parent_reply_id.to_string()),
    }
}

/// A reply hanging directly off the post.
pub fn reply_to_post(id: &str, body: &str, post_id: &str) -> Reply {
    Reply {
        id: id.to_string(),
        author: "tester".to_string(),
        body: body.to_string(),
        url: format!("https://example.com/r/test/{id}"),
        parent: ParentRef::Post(post_id.to_string()),
    }
}

/// A Post-kind flagged item with the given identity and text.
pub fn flagged(url: &str, text: &str) -> FlaggedItem {
    FlaggedItem {
        id: "item".to_string(),
        kind: ItemKind::Post,
        author: "tester".to_string(),
        text: text.to_string(),
        source_name: "test".to_string(),
        url: url.to_string(),
        parent: None,
        flagged_at: Utc::now(),
    }
}
