//! RSS 2.0 document parsing.
//!
//! Decodes an `<rss><channel>` document into [`ParsedFeed`] and applies
//! HTML entity decoding to the channel and item text fields. `pubDate` is
//! kept as the raw source string: feeds do not agree on a date format, so
//! interpretation is deferred to whoever reads the stored post.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while decoding a feed document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Document is not valid UTF-8
    #[error("Feed is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    /// Document is not a well-formed RSS channel
    #[error("Invalid feed XML: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// A decoded feed document. Transient: lives only for one ingestion cycle.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Items in document order.
    pub items: Vec<ParsedItem>,
}

/// A single decoded feed entry.
#[derive(Debug, Clone)]
pub struct ParsedItem {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    /// Raw publish-date string, unparsed.
    pub published_at: Option<String>,
}

// Wire shape of the document. Real-world feeds omit elements freely, so
// every field defaults; empty strings are converted to None for the
// optional fields after decoding.
#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: RssChannel,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RssChannel {
    title: String,
    link: String,
    description: String,
    #[serde(rename = "item")]
    items: Vec<RssItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RssItem {
    title: String,
    link: String,
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: String,
}

/// Decode a fetched feed document.
///
/// Item order in the result matches document order. Malformed XML or a
/// missing channel element is a [`ParseError`].
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, ParseError> {
    let text = std::str::from_utf8(bytes)?;
    let document: RssDocument = quick_xml::de::from_str(text)?;
    let channel = document.channel;

    let items = channel
        .items
        .into_iter()
        .map(|item| ParsedItem {
            title: decode_entities(&item.title),
            link: item.link,
            description: non_empty(item.description).map(|d| decode_entities(&d)),
            published_at: non_empty(item.pub_date),
        })
        .collect();

    Ok(ParsedFeed {
        title: decode_entities(&channel.title),
        link: channel.link,
        description: decode_entities(&channel.description),
        items,
    })
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Decode HTML entities, keeping the original text when it contains a
/// stray `&` that does not introduce a valid entity (common in titles
/// like "AT&T" once the XML layer has already unescaped them).
fn decode_entities(s: &str) -> String {
    match htmlescape::decode_html(s) {
        Ok(decoded) => decoded,
        Err(_) => s.to_string(),
    }
}
