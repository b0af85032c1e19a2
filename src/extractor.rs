use futures::{Stream, StreamExt};
use reqwest::Url;
use scraper::{Html, Selector};

use crate::data_models::SearchResult;
use crate::error::{BotError, Result};

/// Result headings on a Google results page.
pub const RESULT_SELECTOR: &str = "h3.r";

/// Relative redirect links (`/url?q=...`) are resolved against this.
const REDIRECT_BASE: &str = "https://www.google.com/";

/// Drains the body stream into a string. Fails on transport errors mid-body
/// or when the document is not utf-8.
pub async fn read_document<S>(mut stream: S) -> Result<String>
where
    S: Stream<Item = Result<Vec<u8>>> + Unpin,
{
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| BotError::Parse(format!("cannot read document: {e}")))?;
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|e| BotError::Parse(format!("document is not utf-8: {e}")))
}

pub fn extract_results(html: &str) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let heading_selector = Selector::parse(RESULT_SELECTOR)
        .map_err(|e| BotError::Parse(format!("invalid result selector: {e:?}")))?;
    let anchor_selector =
        Selector::parse("a").map_err(|e| BotError::Parse(format!("invalid anchor selector: {e:?}")))?;

    let mut results = Vec::new();
    for heading in document.select(&heading_selector) {
        let Some(anchor) = heading.select(&anchor_selector).next() else {
            continue;
        };
        let orig_url = anchor.value().attr("href").unwrap_or_default().to_string();
        let name = anchor.text().collect::<String>();
        results.push(SearchResult::new(name, target_url(&orig_url), orig_url));
    }
    Ok(results)
}

pub async fn extract_from_stream<S>(stream: S) -> Result<Vec<SearchResult>>
where
    S: Stream<Item = Result<Vec<u8>>> + Unpin,
{
    let html = read_document(stream).await?;
    extract_results(&html)
}

/// Decodes the `q` parameter of a redirect link. Empty when the link is
/// malformed or carries no well-formed `q`.
///
/// Scheme-less references (`/url?...`, `//host/url?...`) are resolved against
/// the results host; anything else must parse as an absolute url.
pub fn target_url(orig_url: &str) -> String {
    let parsed = if is_reference(orig_url) {
        Url::parse(REDIRECT_BASE).and_then(|base| base.join(orig_url))
    } else {
        Url::parse(orig_url)
    };
    let Ok(url) = parsed else {
        return String::new();
    };
    let Some(query) = url.query() else {
        return String::new();
    };

    // Raw pairs line up with `query_pairs`, which also skips empty segments.
    // Pairs with a broken escape are dropped, the way a strict query parser does.
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .zip(url.query_pairs())
        .find(|(raw, (key, _))| key == "q" && has_valid_escapes(raw))
        .map(|(_, (_, value))| value.into_owned())
        .unwrap_or_default()
}

/// No scheme: nothing before the first `/`, `?` or `#` contains a colon.
/// `://x` has an empty scheme and is not a reference.
fn is_reference(href: &str) -> bool {
    let head = href.split(['/', '?', '#']).next().unwrap_or_default();
    !head.contains(':')
}

/// Every `%` must be followed by two hex digits.
fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    })
}
