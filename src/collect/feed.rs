//! Feed retrieval and RSS parsing.

use std::{io::Read as _, time::Duration};

use anyhow::Context as _;
use serde::Deserialize;

use crate::foundation::error::{ReelError, ReelResult};

/// One raw entry as published by a feed, before sanitizing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    /// Usually HTML; `None` when missing or blank.
    pub description: Option<String>,
    pub link: String,
    /// `<author>`, else `<dc:creator>`.
    pub author: Option<String>,
    /// Raw `<pubDate>`.
    pub published: Option<String>,
}

/// Source of feed entries, keyed by URL.
pub trait FeedSource {
    fn fetch(&self, url: &str) -> ReelResult<Vec<FeedEntry>>;
}

/// HTTP-backed RSS source.
#[derive(Clone, Debug)]
pub struct RssFeedSource {
    agent: ureq::Agent,
}

impl RssFeedSource {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl Default for RssFeedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSource for RssFeedSource {
    fn fetch(&self, url: &str) -> ReelResult<Vec<FeedEntry>> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| ReelError::feed(format!("GET '{url}' failed: {e}")))?;
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .with_context(|| format!("read feed body from '{url}'"))?;
        let text = String::from_utf8_lossy(&body);
        parse_rss(&text)
    }
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    author: Option<String>,
    #[serde(rename = "creator")]
    creator: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Parse an RSS 2.0 document into entries, in document order.
pub fn parse_rss(xml: &str) -> ReelResult<Vec<FeedEntry>> {
    let cleaned = scrub_html_entities_for_xml(xml);
    let rss: Rss = quick_xml::de::from_str(&cleaned)
        .map_err(|e| ReelError::feed(format!("parse rss xml: {e}")))?;

    Ok(rss
        .channel
        .item
        .into_iter()
        .map(|it| FeedEntry {
            title: it.title.unwrap_or_default(),
            description: non_blank(it.description),
            link: it.link.map(|l| l.trim().to_string()).unwrap_or_default(),
            author: non_blank(it.author).or_else(|| non_blank(it.creator)),
            published: non_blank(it.pub_date),
        })
        .collect())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// HTML entities that are not predefined in XML and would abort the parser.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&middot;", "·")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
#[path = "../../tests/unit/collect/feed.rs"]
mod tests;
