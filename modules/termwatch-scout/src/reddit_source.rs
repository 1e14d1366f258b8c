use anyhow::Result;
use async_trait::async_trait;

use reddit_client::RedditClient;
use termwatch_common::{ParentRef, Post, Reply};

use crate::traits::ContentSource;

/// Reply-tree fetch bound passed to the listing API per submission.
const REPLIES_PER_POST: u32 = 500;

/// [`ContentSource`] backed by the Reddit REST API. Converts wire types
/// into the normalized records the scanner consumes; the client itself
/// handles auth and continuation materialization.
pub struct RedditSource {
    client: RedditClient,
}

impl RedditSource {
    pub fn new(client: RedditClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentSource for RedditSource {
    async fn recent_posts(&self, source_name: &str, limit: u32) -> Result<Vec<Post>> {
        let submissions = self.client.hot_posts(source_name, limit).await?;
        Ok(submissions
            .into_iter()
            .map(|s| Post {
                id: s.id,
                author: s.author.unwrap_or_default(),
                title: s.title,
                body: s.selftext,
                source_name: s.subreddit,
                url: full_url(&s.permalink),
            })
            .collect())
    }

    async fn replies(&self, post: &Post) -> Result<Vec<Reply>> {
        let comments = self
            .client
            .comments(&post.source_name, &post.id, REPLIES_PER_POST)
            .await?;
        Ok(comments
            .into_iter()
            .map(|c| Reply {
                id: c.id,
                author: c.author.unwrap_or_default(),
                body: c.body,
                url: full_url(&c.permalink),
                parent: parent_ref(&c.parent_id),
            })
            .collect())
    }
}

/// Map the API's kind-prefixed parent fullname to a typed reference.
/// `t1_` is a comment, `t3_` the submission itself; anything else is
/// unusable and degrades to Unknown.
fn parent_ref(parent_id: &str) -> ParentRef {
    match parent_id.split_once('_') {
        Some(("t1", id)) if !id.is_empty() => ParentRef::Reply(id.to_string()),
        Some(("t3", id)) if !id.is_empty() => ParentRef::Post(id.to_string()),
        _ => ParentRef::Unknown,
    }
}

fn full_url(permalink: &str) -> String {
    format!("https://www.reddit.com{permalink}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_ref_maps_kind_prefixes() {
        assert_eq!(parent_ref("t1_abc"), ParentRef::Reply("abc".to_string()));
        assert_eq!(parent_ref("t3_xyz"), ParentRef::Post("xyz".to_string()));
        assert_eq!(parent_ref("t5_sub"), ParentRef::Unknown);
        assert_eq!(parent_ref("garbage"), ParentRef::Unknown);
        assert_eq!(parent_ref(""), ParentRef::Unknown);
        assert_eq!(parent_ref("t1_"), ParentRef::Unknown);
    }

    #[test]
    fn permalinks_become_absolute_urls() {
        assert_eq!(
            full_url("/r/test/comments/p1/title/"),
            "https://www.reddit.com/r/test/comments/p1/title/"
        );
    }
}
