//! News collection: fetch every configured feed and normalize entries into [`NewsItem`]s.

pub mod feed;
pub mod sanitize;

use serde::{Deserialize, Serialize};

use crate::{
    config::manifest::{CollectLimits, FeedSpec},
    foundation::error::{ReelError, ReelResult},
};

pub use feed::{FeedEntry, FeedSource, RssFeedSource, parse_rss};
pub use sanitize::sanitize_text;

/// One news item ready for rendering and publishing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Dense, 1-based, unique within a run.
    pub id: u32,
    /// Category of the feed the item came from.
    pub category: String,
    /// Sanitized headline.
    pub title: String,
    /// Sanitized description.
    pub summary: String,
    /// `[<publisher>] <link>`, empty when the entry has no link.
    pub source_line: String,
    /// Trimmed article URL.
    pub link: String,
    /// Entry author, or the publisher when the feed names none.
    pub author: String,
    /// Publication time exactly as the feed wrote it.
    #[serde(default)]
    pub published_at: Option<String>,
}

impl NewsItem {
    fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.summary.is_empty() && !self.source_line.is_empty()
    }
}

fn normalize_entry(category: &str, entry: FeedEntry, publisher: &str) -> NewsItem {
    let link = entry.link.trim().to_string();
    let source_line = if link.is_empty() {
        String::new()
    } else {
        format!("[{publisher}] {link}")
    };
    NewsItem {
        id: 0,
        category: category.to_string(),
        title: sanitize_text(&entry.title),
        summary: sanitize_text(entry.description.as_deref().unwrap_or_default()),
        source_line,
        link,
        author: entry.author.unwrap_or_else(|| publisher.to_string()),
        published_at: entry.published,
    }
}

/// Fetch every feed and return the capped, id-numbered item list.
///
/// A feed that fails to fetch or parse is logged and contributes nothing. Finding no complete
/// item at all is a [`ReelError::Feed`].
#[tracing::instrument(skip_all, fields(feeds = feeds.len()))]
pub fn collect_news(
    feeds: &[FeedSpec],
    limits: CollectLimits,
    publisher: &str,
    source: &dyn FeedSource,
) -> ReelResult<Vec<NewsItem>> {
    let mut items = Vec::new();

    for spec in feeds {
        let entries = match source.fetch(&spec.url) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    category = %spec.category,
                    url = %spec.url,
                    error = %err,
                    "feed skipped"
                );
                continue;
            }
        };
        let fetched = entries.len();
        let kept_before = items.len();
        items.extend(
            entries
                .into_iter()
                .take(limits.per_category)
                .map(|e| normalize_entry(&spec.category, e, publisher))
                .filter(NewsItem::is_complete),
        );
        tracing::info!(
            category = %spec.category,
            fetched,
            kept = items.len() - kept_before,
            "feed collected"
        );
    }

    for (idx, item) in items.iter_mut().enumerate() {
        item.id = u32::try_from(idx + 1)
            .map_err(|_| ReelError::feed("too many news items to number"))?;
    }
    items.truncate(limits.total);

    if items.is_empty() {
        return Err(ReelError::feed("no news items collected from any feed"));
    }
    tracing::info!(total = items.len(), "news collected");
    Ok(items)
}

#[cfg(test)]
#[path = "../../tests/unit/collect/collect.rs"]
mod tests;
