pub mod error;
pub mod types;

pub use error::{RedditError, Result};
pub use types::{Comment, Submission};

use std::sync::Mutex;

use serde_json::Value;

use types::{ListingData, MoreChildren, Thing, TokenResponse};

const API_URL: &str = "https://oauth.reddit.com";
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Cap on `/api/morechildren` round-trips per submission. Trees deeper
/// than this keep their remaining stubs dropped with a warning.
const MAX_CONTINUATION_ROUNDS: usize = 10;

/// Pure Reddit REST client using application-only OAuth.
/// The token is fetched lazily, cached, and refreshed once on a 401.
pub struct RedditClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    user_agent: String,
    token: Mutex<Option<String>>,
}

impl RedditClient {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            user_agent,
            token: Mutex::new(None),
        }
    }

    async fn fetch_token(&self) -> Result<String> {
        let resp = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RedditError::Auth(format!(
                "token request failed (status {}): {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = resp.json().await?;
        Ok(token.access_token)
    }

    async fn token(&self) -> Result<String> {
        let cached = self
            .token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(token) = cached {
            return Ok(token);
        }

        let token = self.fetch_token().await?;
        tracing::debug!("Obtained application-only access token");
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        Ok(token)
    }

    /// Authenticated GET returning raw JSON. Retries exactly once after
    /// refreshing the token if the API answers 401.
    async fn get(&self, url: &str) -> Result<Value> {
        for attempt in 0..2 {
            let token = self.token().await?;
            let resp = self
                .client
                .get(url)
                .bearer_auth(&token)
                .header(reqwest::header::USER_AGENT, &self.user_agent)
                .send()
                .await?;

            let status = resp.status();
            if status.as_u16() == 401 && attempt == 0 {
                tracing::debug!("Access token rejected, refreshing");
                *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
                continue;
            }
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(RedditError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }
            return Ok(resp.json().await?);
        }

        Err(RedditError::Auth("token rejected after refresh".to_string()))
    }

    /// Fetch up to `limit` submissions from a subreddit's hot listing.
    pub async fn hot_posts(&self, subreddit: &str, limit: u32) -> Result<Vec<Submission>> {
        let url = format!("{API_URL}/r/{subreddit}/hot?limit={limit}&raw_json=1");
        let value = self.get(&url).await?;

        let listing: Thing = serde_json::from_value(value)?;
        let data: ListingData = serde_json::from_value(listing.data)?;

        let mut posts = Vec::new();
        for child in data.children {
            if child.kind == "t3" {
                posts.push(serde_json::from_value(child.data)?);
            }
        }
        tracing::debug!(subreddit, count = posts.len(), "Fetched hot submissions");
        Ok(posts)
    }

    /// Fetch a submission's full comment tree, flattened depth-first.
    /// Continuation ("more") stubs are materialized via `/api/morechildren`;
    /// stubs that cannot be resolved are dropped with a warning.
    pub async fn comments(&self, subreddit: &str, article: &str, limit: u32) -> Result<Vec<Comment>> {
        let url = format!("{API_URL}/r/{subreddit}/comments/{article}?limit={limit}&raw_json=1");
        let value = self.get(&url).await?;

        // The endpoint returns a two-element array: [post listing, comment listing].
        let listings: Vec<Thing> = serde_json::from_value(value)?;
        let comment_listing = match listings.into_iter().nth(1) {
            Some(thing) => serde_json::from_value::<ListingData>(thing.data)?,
            None => {
                return Err(RedditError::Parse(
                    "comments response missing comment listing".to_string(),
                ))
            }
        };

        let mut comments = Vec::new();
        let mut pending_stubs = Vec::new();
        flatten_listing(comment_listing, &mut comments, &mut pending_stubs)?;

        let mut rounds = 0;
        while !pending_stubs.is_empty() && rounds < MAX_CONTINUATION_ROUNDS {
            rounds += 1;
            let batch: Vec<String> = pending_stubs
                .drain(..pending_stubs.len().min(100))
                .collect();
            let url = format!(
                "{API_URL}/api/morechildren?api_type=json&link_id=t3_{article}&children={}&raw_json=1",
                batch.join(",")
            );
            let value = match self.get(&url).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(article, error = %e, dropped = batch.len(), "Continuation fetch failed, dropping stubs");
                    continue;
                }
            };
            let more: MoreChildren = serde_json::from_value(value)?;
            for thing in more.json.data.things {
                match thing.kind.as_str() {
                    "t1" => comments.push(serde_json::from_value(thing.data)?),
                    "more" => collect_stub_ids(&thing.data, &mut pending_stubs),
                    _ => {}
                }
            }
        }
        if !pending_stubs.is_empty() {
            tracing::warn!(
                article,
                remaining = pending_stubs.len(),
                "Unresolved continuation stubs dropped"
            );
        }

        tracing::debug!(subreddit, article, count = comments.len(), "Fetched comment tree");
        Ok(comments)
    }
}

/// Depth-first walk of a comment listing: t1 comments go to `out`,
/// "more" stub ids to `stubs`, anything else is skipped.
fn flatten_listing(listing: ListingData, out: &mut Vec<Comment>, stubs: &mut Vec<String>) -> Result<()> {
    for child in listing.children {
        match child.kind.as_str() {
            "t1" => {
                let comment: Comment = serde_json::from_value(child.data)?;
                let nested = comment.replies.clone();
                out.push(comment);
                if nested.is_object() {
                    let thing: Thing = serde_json::from_value(nested)?;
                    let listing: ListingData = serde_json::from_value(thing.data)?;
                    flatten_listing(listing, out, stubs)?;
                }
            }
            "more" => collect_stub_ids(&child.data, stubs),
            other => tracing::debug!(kind = other, "Skipping unexpected listing child"),
        }
    }
    Ok(())
}

fn collect_stub_ids(data: &Value, stubs: &mut Vec<String>) {
    if let Some(ids) = data.get("children").and_then(Value::as_array) {
        stubs.extend(ids.iter().filter_map(|v| v.as_str().map(str::to_string)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMENT_LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "children": [
                {
                    "kind": "t1",
                    "data": {
                        "id": "c1",
                        "author": "alice",
                        "body": "top level",
                        "permalink": "/r/test/comments/p1/_/c1/",
                        "parent_id": "t3_p1",
                        "replies": {
                            "kind": "Listing",
                            "data": {
                                "children": [
                                    {
                                        "kind": "t1",
                                        "data": {
                                            "id": "c2",
                                            "author": null,
                                            "body": "nested",
                                            "permalink": "/r/test/comments/p1/_/c2/",
                                            "parent_id": "t1_c1",
                                            "replies": ""
                                        }
                                    }
                                ]
                            }
                        }
                    }
                },
                {
                    "kind": "more",
                    "data": { "children": ["c9", "c10"] }
                }
            ]
        }
    }"#;

    #[test]
    fn flatten_walks_nested_replies_and_collects_stubs() {
        let thing: Thing = serde_json::from_str(COMMENT_LISTING).unwrap();
        let listing: ListingData = serde_json::from_value(thing.data).unwrap();

        let mut comments = Vec::new();
        let mut stubs = Vec::new();
        flatten_listing(listing, &mut comments, &mut stubs).unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, "c1");
        assert_eq!(comments[1].id, "c2");
        assert_eq!(comments[1].author, None);
        assert_eq!(comments[1].parent_id, "t1_c1");
        assert_eq!(stubs, vec!["c9", "c10"]);
    }

    #[test]
    fn submission_parses_with_missing_selftext() {
        let raw = r#"{
            "id": "p1",
            "name": "t3_p1",
            "author": "bob",
            "title": "A title",
            "subreddit": "test",
            "permalink": "/r/test/comments/p1/a_title/"
        }"#;
        let sub: Submission = serde_json::from_str(raw).unwrap();
        assert_eq!(sub.selftext, "");
        assert_eq!(sub.name, "t3_p1");
    }
}
