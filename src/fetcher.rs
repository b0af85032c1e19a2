use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Url;
use std::time::Duration;

use crate::error::{BotError, Result};

pub const GOOGLE_SEARCH_URL: &str = "https://www.google.ru/search?q=&oe=utf-8&ie=utf-8";

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Raw body of a results page, chunk by chunk.
pub type PageStream = BoxStream<'static, Result<Vec<u8>>>;

/// Issues search requests against a fixed url template.
#[derive(Debug, Clone)]
pub struct SearchFetcher {
    client: reqwest::Client,
    template: Url,
}

impl SearchFetcher {
    pub fn new(template: &str, timeout: Duration) -> Result<SearchFetcher> {
        let template = Url::parse(template)
            .map_err(|e| BotError::Transport(format!("cannot parse url template {template}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BotError::Transport(format!("failed to build http client: {e}")))?;
        Ok(SearchFetcher { client, template })
    }

    /// Template url with `q` set to `query`. All other parameters are kept in place.
    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.template.clone();
        let mut pairs: Vec<(String, String)> = self
            .template
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        match pairs.iter_mut().find(|(k, _)| k == "q") {
            Some(pair) => pair.1 = query.to_string(),
            None => pairs.insert(0, ("q".to_string(), query.to_string())),
        }
        url.query_pairs_mut().clear().extend_pairs(&pairs);
        url
    }

    pub async fn fetch(&self, query: &str) -> Result<PageStream> {
        if query.trim().is_empty() {
            return Err(BotError::Transport("empty search query".to_string()));
        }
        let url = self.search_url(query);
        tracing::debug!(%url, "fetching results page");
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BotError::Transport(format!("cannot get page: {e}")))?
            .error_for_status()
            .map_err(|e| BotError::Transport(format!("search engine answered: {e}")))?;

        let stream = res
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| BotError::Transport(format!("cannot read page: {e}")))
            })
            .boxed();
        Ok(stream)
    }
}
