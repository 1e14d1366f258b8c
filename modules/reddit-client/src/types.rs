use serde::Deserialize;

/// Response to an application-only OAuth token request.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Generic `{kind, data}` envelope used throughout the listing API.
/// `data` stays untyped because listing children are heterogeneous
/// (t1 comments, t3 links, "more" continuation stubs).
#[derive(Debug, Deserialize)]
pub struct Thing {
    pub kind: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// A t3 link (top-level submission).
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub id: String,
    /// Fullname, e.g. `t3_abc123`.
    pub name: String,
    /// Absent for deleted accounts.
    pub author: Option<String>,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub subreddit: String,
    pub permalink: String,
}

/// A t1 comment.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Absent for deleted accounts.
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    pub permalink: String,
    /// Kind-prefixed fullname of the immediate parent: `t1_...` for a
    /// comment, `t3_...` for the submission itself.
    pub parent_id: String,
    /// Nested replies listing; the API sends `""` when there are none.
    #[serde(default)]
    pub replies: serde_json::Value,
}

/// Payload of a `/api/morechildren` response.
#[derive(Debug, Deserialize)]
pub struct MoreChildren {
    pub json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
pub struct MoreChildrenJson {
    pub data: MoreChildrenData,
}

#[derive(Debug, Deserialize)]
pub struct MoreChildrenData {
    #[serde(default)]
    pub things: Vec<Thing>,
}
