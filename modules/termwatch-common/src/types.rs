use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Collaborator-facing raw types ---

/// A top-level submission fetched from a source, before any matching.
/// Content-source implementations convert their native types into this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    /// Empty when the source reports a deleted/missing account.
    pub author: String,
    pub title: String,
    pub body: String,
    pub source_name: String,
    pub url: String,
}

/// A reply fetched from a source, flattened out of its tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    /// Empty when the source reports a deleted/missing account.
    pub author: String,
    pub body: String,
    pub url: String,
    pub parent: ParentRef,
}

/// Typed reference to a reply's immediate parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParentRef {
    /// The reply hangs directly off the post.
    Post(String),
    /// The reply answers another reply.
    Reply(String),
    /// The source gave no usable parent reference.
    Unknown,
}

// --- Flagged records ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Post,
    Reply,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Post => write!(f, "post"),
            ItemKind::Reply => write!(f, "reply"),
        }
    }
}

/// Parent details copied onto a Reply-kind item when its immediate parent
/// could be located among the same scan's fetched replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentInfo {
    pub id: String,
    pub author: String,
    pub text: String,
    pub url: String,
}

/// A post or reply whose text matched the watchlist.
///
/// `url` is the stable cross-fetch identity and the only dedup key.
/// Immutable once admitted into the accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedItem {
    pub id: String,
    pub kind: ItemKind,
    pub author: String,
    /// Title+body for posts, reply body for replies. Always assigned,
    /// possibly empty, never absent.
    pub text: String,
    pub source_name: String,
    pub url: String,
    /// Populated only for replies with a resolvable parent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentInfo>,
    pub flagged_at: DateTime<Utc>,
}

// --- Watchlist ---

/// Ordered set of lowercase terms loaded once at startup.
/// Immutable for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct Watchlist {
    terms: Vec<String>,
    index: HashSet<String>,
}

impl Watchlist {
    /// Build from raw terms: lowercased, trimmed, empties and duplicates
    /// dropped, first-seen order preserved.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Self::default();
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && out.index.insert(term.clone()) {
                out.terms.push(term);
            }
        }
        out
    }

    /// Parse a comma-separated term list. An empty or missing list yields
    /// an empty watchlist, never an error.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains(token)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchlist_lowercases_and_dedups() {
        let w = Watchlist::parse("Spam, scam ,SPAM,, phish");
        assert_eq!(w.terms(), &["spam", "scam", "phish"]);
        assert!(w.contains("spam"));
        assert!(!w.contains("Spam"));
    }

    #[test]
    fn empty_input_yields_empty_watchlist() {
        assert!(Watchlist::parse("").is_empty());
        assert!(Watchlist::parse(" , ,").is_empty());
    }
}
