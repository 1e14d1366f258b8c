use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use termwatch_common::{
    FlaggedItem, ItemKind, ParentInfo, ParentRef, Reply, TermWatchError, Watchlist,
};

use crate::matcher;
use crate::traits::{ContentSource, TextSplitter};

/// Scans one named source per call: fetches recent posts and their reply
/// trees, runs the term matcher, and returns matched items as normalized
/// records.
pub struct SourceScanner {
    source: Arc<dyn ContentSource>,
    splitter: Arc<dyn TextSplitter>,
}

impl SourceScanner {
    pub fn new(source: Arc<dyn ContentSource>, splitter: Arc<dyn TextSplitter>) -> Self {
        Self { source, splitter }
    }

    /// Scan up to `max_items` recent posts of `source_name`. A failed
    /// post fetch surfaces as `SourceUnavailable`; a failed reply fetch
    /// for a single post is logged and that post's replies are skipped.
    pub async fn scan(
        &self,
        source_name: &str,
        watchlist: &Watchlist,
        max_items: u32,
    ) -> Result<Vec<FlaggedItem>, TermWatchError> {
        let posts = self
            .source
            .recent_posts(source_name, max_items)
            .await
            .map_err(|e| TermWatchError::SourceUnavailable {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;

        debug!(source = source_name, posts = posts.len(), "Fetched recent posts");

        let mut flagged = Vec::new();
        for post in &posts {
            let text = if post.body.is_empty() {
                post.title.clone()
            } else {
                format!("{}\n{}", post.title, post.body)
            };
            if self.matched(&text, watchlist) {
                flagged.push(FlaggedItem {
                    id: post.id.clone(),
                    kind: ItemKind::Post,
                    author: post.author.clone(),
                    text,
                    source_name: post.source_name.clone(),
                    url: post.url.clone(),
                    parent: None,
                    flagged_at: Utc::now(),
                });
            }

            let replies = match self.source.replies(post).await {
                Ok(replies) => replies,
                Err(e) => {
                    warn!(source = source_name, post = post.id.as_str(), error = %e, "Reply fetch failed, skipping post's replies");
                    continue;
                }
            };

            for reply in &replies {
                if self.matched(&reply.body, watchlist) {
                    flagged.push(FlaggedItem {
                        id: reply.id.clone(),
                        kind: ItemKind::Reply,
                        author: reply.author.clone(),
                        text: reply.body.clone(),
                        source_name: post.source_name.clone(),
                        url: reply.url.clone(),
                        parent: resolve_parent(reply, &replies),
                        flagged_at: Utc::now(),
                    });
                }
            }
        }

        debug!(source = source_name, matched = flagged.len(), "Scan complete");
        Ok(flagged)
    }

    fn matched(&self, text: &str, watchlist: &Watchlist) -> bool {
        let tokens = self.splitter.tokenize(&text.to_lowercase());
        matcher::matches(&tokens, watchlist)
    }
}

/// Resolve a reply's immediate parent among the same post's fetched
/// replies. The post itself and unlocatable parents both degrade to
/// `None`.
fn resolve_parent(reply: &Reply, replies: &[Reply]) -> Option<ParentInfo> {
    let parent_id = match &reply.parent {
        ParentRef::Reply(id) => id,
        ParentRef::Post(_) | ParentRef::Unknown => return None,
    };
    replies
        .iter()
        .find(|candidate| &candidate.id == parent_id)
        .map(|parent| ParentInfo {
            id: parent.id.clone(),
            author: parent.author.clone(),
            text: parent.body.clone(),
            url: parent.url.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::WordSplitter;
    use crate::testing::{post, reply, reply_to_post, MockSource};

    fn scanner(source: MockSource) -> SourceScanner {
        SourceScanner::new(Arc::new(source), Arc::new(WordSplitter))
    }

    #[tokio::test]
    async fn matching_post_is_flagged_with_its_url() {
        let source = MockSource::new().on_posts(
            "test",
            vec![post("p1", "test", "A thread", "this is SPAM content")],
        );
        let watchlist = Watchlist::new(["spam"]);

        let items = scanner(source).scan("test", &watchlist, 10).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::Post);
        assert_eq!(items[0].url, "https://example.com/r/test/p1");
        assert!(items[0].text.contains("SPAM"));
    }

    #[tokio::test]
    async fn clean_posts_produce_nothing() {
        let source =
            MockSource::new().on_posts("test", vec![post("p1", "test", "Hello", "nothing here")]);
        let watchlist = Watchlist::new(["spam"]);

        let items = scanner(source).scan("test", &watchlist, 10).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn matching_reply_resolves_parent_among_fetched_replies() {
        let source = MockSource::new()
            .on_posts("test", vec![post("p1", "test", "Thread", "")])
            .on_replies(
                "p1",
                vec![
                    reply_to_post("r1", "harmless parent", "p1"),
                    reply("r2", "pure spam here", "r1"),
                ],
            );
        let watchlist = Watchlist::new(["spam"]);

        let items = scanner(source).scan("test", &watchlist, 10).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::Reply);
        let parent = items[0].parent.as_ref().expect("parent resolved");
        assert_eq!(parent.id, "r1");
        assert_eq!(parent.text, "harmless parent");
    }

    #[tokio::test]
    async fn post_parent_and_unknown_parent_degrade_to_none() {
        let source = MockSource::new()
            .on_posts("test", vec![post("p1", "test", "Thread", "")])
            .on_replies(
                "p1",
                vec![
                    reply_to_post("r1", "spam directly under the post", "p1"),
                    reply("r2", "spam under a pruned reply", "gone"),
                ],
            );
        let watchlist = Watchlist::new(["spam"]);

        let items = scanner(source).scan("test", &watchlist, 10).await.unwrap();

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.parent.is_none()));
    }

    #[tokio::test]
    async fn failed_source_surfaces_as_source_unavailable() {
        let source = MockSource::new().failing("deleted_sub");
        let watchlist = Watchlist::new(["spam"]);

        let err = scanner(source)
            .scan("deleted_sub", &watchlist, 10)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TermWatchError::SourceUnavailable { ref source_name, .. } if source_name == "deleted_sub"
        ));
    }

    #[tokio::test]
    async fn failed_reply_fetch_keeps_the_post_flag() {
        // Posts resolve but replies error: the post's own match survives.
        let source = MockSource::new()
            .on_posts("test", vec![post("p1", "test", "spam thread", "")])
            .failing_replies("p1");
        let watchlist = Watchlist::new(["spam"]);

        let items = scanner(source).scan("test", &watchlist, 10).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::Post);
    }

    #[tokio::test]
    async fn missing_author_is_recorded_as_empty_string() {
        let mut anonymous = post("p1", "test", "spam thread", "");
        anonymous.author = String::new();
        let source = MockSource::new().on_posts("test", vec![anonymous]);
        let watchlist = Watchlist::new(["spam"]);

        let items = scanner(source).scan("test", &watchlist, 10).await.unwrap();
        assert_eq!(items[0].author, "");
    }
}
