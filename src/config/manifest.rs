//! Manifest parsing.
//!
//! The manifest is a sectioned text file. A bracketed header opens a section and any other
//! bracketed line closes it. Every field has a default; malformed values keep the default and
//! are reported with a warning rather than failing the run.

use std::path::Path;

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Publisher credited in every card's source line unless the manifest overrides it.
pub const DEFAULT_PUBLISHER: &str = "연합뉴스";

/// One category and the feed URL it is collected from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSpec {
    /// Label shown on cards and used for tags, e.g. "Sports".
    pub category: String,
    /// RSS document URL.
    pub url: String,
}

impl FeedSpec {
    pub fn new(category: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            url: url.into(),
        }
    }
}

/// Caps applied while collecting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectLimits {
    /// Maximum items kept from each category.
    pub per_category: usize,
    /// Maximum items kept overall.
    pub total: usize,
}

impl Default for CollectLimits {
    fn default() -> Self {
        Self {
            per_category: 10,
            total: 20,
        }
    }
}

/// Optional affiliate notice appended to the published title and description.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateDisclosure {
    /// Affiliate link placed under the notice in the description.
    pub link: Option<String>,
    /// Disclosure sentence appended to the title and description.
    pub notice: Option<String>,
}

impl AffiliateDisclosure {
    pub fn is_empty(&self) -> bool {
        self.link.is_none() && self.notice.is_none()
    }
}

/// Fully resolved manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Feeds in manifest order; collection and ids follow this order.
    pub feeds: Vec<FeedSpec>,
    /// Per-category and overall item caps.
    pub limits: CollectLimits,
    /// Duration of each clip in whole seconds.
    pub clip_secs: u32,
    /// Empty unless the manifest has affiliate sections.
    pub affiliate: AffiliateDisclosure,
    /// Attribution used in source lines and as the fallback author.
    pub publisher: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            limits: CollectLimits::default(),
            clip_secs: 3,
            affiliate: AffiliateDisclosure::default(),
            publisher: DEFAULT_PUBLISHER.to_string(),
        }
    }
}

/// Feeds used when the manifest names none.
pub fn default_feeds() -> Vec<FeedSpec> {
    vec![
        FeedSpec::new("Sports", "https://www.yna.co.kr/rss/sports.xml"),
        FeedSpec::new("Entertainment", "https://www.yna.co.kr/rss/entertainment.xml"),
    ]
}

/// Read and parse the manifest at `path`.
///
/// A missing or unreadable file is not an error: the defaults are returned and a warning is
/// logged.
pub fn load_manifest(path: &Path) -> PipelineConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let config = parse_manifest(&text);
            tracing::debug!(path = %path.display(), feeds = config.feeds.len(), "manifest loaded");
            config
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "manifest unreadable, using defaults"
            );
            PipelineConfig::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    None,
    Feeds,
    CardCount,
    ClipLength,
    Affiliate,
    AffiliateNotice,
    Publisher,
}

fn section_for_header(line: &str) -> Option<Section> {
    let inner = line
        .strip_prefix('[')?
        .strip_suffix(']')?
        .trim()
        .to_ascii_lowercase();
    let section = match inner.as_str() {
        "rss_url 지정" | "feeds" => Section::Feeds,
        "카드뉴스개수" | "card_count" => Section::CardCount,
        "동영상길이" | "clip_length" => Section::ClipLength,
        "쿠팡파트너스" | "affiliate" => Section::Affiliate,
        "쿠팡파트너스 대가성문구" | "affiliate_notice" => Section::AffiliateNotice,
        "publisher" => Section::Publisher,
        _ => Section::None,
    };
    Some(section)
}

/// Parse manifest text. Never fails; see the module docs for the fallback rules.
pub fn parse_manifest(text: &str) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    let mut feeds: Vec<FeedSpec> = Vec::new();
    let mut section = Section::None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(next) = section_for_header(line) {
            section = next;
            continue;
        }

        match section {
            Section::None => {}
            Section::Feeds => match parse_feed_line(line) {
                Some(spec) => upsert_feed(&mut feeds, spec),
                None => tracing::warn!(line, "ignoring feed line without a URL"),
            },
            Section::CardCount => {
                apply_card_count(line, &mut config.limits);
                section = Section::None;
            }
            Section::ClipLength => {
                match first_positive(value_after_colon(line)) {
                    Some(secs) => config.clip_secs = secs,
                    None => tracing::warn!(line, default = config.clip_secs, "invalid clip length"),
                }
                section = Section::None;
            }
            Section::Affiliate => {
                let value = match line.split_once(':') {
                    Some(_) if line.starts_with("http") => line,
                    Some((_, rest)) => rest.trim(),
                    None => line,
                };
                if !value.is_empty() {
                    config.affiliate.link = Some(value.to_string());
                }
                section = Section::None;
            }
            Section::AffiliateNotice => {
                config.affiliate.notice = Some(line.to_string());
                section = Section::None;
            }
            Section::Publisher => {
                config.publisher = line.to_string();
                section = Section::None;
            }
        }
    }

    if feeds.is_empty() {
        tracing::warn!("manifest names no feeds, using defaults");
    } else {
        config.feeds = feeds;
    }
    config
}

fn upsert_feed(feeds: &mut Vec<FeedSpec>, spec: FeedSpec) {
    match feeds.iter_mut().find(|f| f.category == spec.category) {
        Some(existing) => existing.url = spec.url,
        None => feeds.push(spec),
    }
}

fn parse_feed_line(line: &str) -> Option<FeedSpec> {
    let start = line.find("http")?;
    let url = line[start..].trim();
    let label = line[..start]
        .trim()
        .trim_end_matches(['=', ':'])
        .trim();

    let category = if label.is_empty() {
        category_from_url(url)?
    } else {
        label.to_string()
    };
    Some(FeedSpec::new(category, url))
}

/// Category label derived from a feed URL: `.../rss/<name>.xml` yields `Name`, otherwise the
/// stem of the last path segment.
pub fn category_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.split_once("://").map_or(path, |(_, rest)| rest);
    let name = match path.split_once("rss/") {
        Some((_, rest)) => rest.split(".xml").next().unwrap_or(rest),
        None => {
            let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
            last.split('.').next().unwrap_or(last)
        }
    };
    let name = name.trim_matches('/');
    if name.is_empty() {
        return None;
    }
    Some(capitalize_first(name))
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn number_regex() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

fn first_positive<T>(text: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let found = number_regex().find(text)?;
    let value: T = found.as_str().parse().ok()?;
    (value > T::default()).then_some(value)
}

fn value_after_colon(line: &str) -> &str {
    line.split_once(':').map_or(line, |(_, rest)| rest)
}

fn apply_card_count(line: &str, limits: &mut CollectLimits) {
    let value = value_after_colon(line);
    let (per_cat_part, total_part) = match value.split_once(',') {
        Some((a, b)) => (a, Some(b)),
        None => (value, None),
    };

    match first_positive(per_cat_part) {
        Some(n) => limits.per_category = n,
        None => tracing::warn!(
            line,
            default = limits.per_category,
            "invalid per-category card count"
        ),
    }

    let Some(total_part) = total_part else {
        return;
    };
    let lowered = total_part.to_lowercase();
    let after_marker = lowered
        .find("최대")
        .map(|i| &lowered[i + "최대".len()..])
        .or_else(|| lowered.find("max").map(|i| &lowered[i + "max".len()..]))
        .unwrap_or(&lowered);
    match first_positive(after_marker) {
        Some(m) => limits.total = m,
        None => tracing::warn!(line, default = limits.total, "invalid total card count"),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/manifest.rs"]
mod tests;
