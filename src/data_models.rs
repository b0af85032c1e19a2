use serde::{Deserialize, Serialize};

/// One search request coming from a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub query: String,
    pub chat_id: i64,
}

impl Task {
    pub fn new(query: String, chat_id: i64) -> Task {
        Task {
            id: nanoid::nanoid!(8),
            query,
            chat_id,
        }
    }
}

/// A single link scraped from a results page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub name: String,
    /// Target url decoded from the redirect link. Empty when it could not be decoded.
    pub url: String,
    /// The redirect link exactly as it appeared in the page.
    pub pingback_url: String,
}

impl SearchResult {
    pub fn new(name: String, url: String, pingback_url: String) -> SearchResult {
        SearchResult {
            name,
            url,
            pingback_url,
        }
    }
}
