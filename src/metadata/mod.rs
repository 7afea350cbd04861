//! Publish-ready metadata for a finished run.

pub mod tags;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    collect::NewsItem,
    config::AffiliateDisclosure,
    encode::combine::ClipHandoff,
    foundation::{
        context::RunStamp,
        error::{ReelError, ReelResult},
    },
};

/// Publishing-service title limit, in characters.
pub const TITLE_MAX_CHARS: usize = 100;
/// Publishing-service description limit, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 5000;

const LIGHT_CATEGORIES: [&str; 4] = ["스포츠", "연예", "Sports", "Entertainment"];

/// Coarse content category understood by the publishing service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentCategory {
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "News & Politics")]
    NewsAndPolitics,
}

impl ContentCategory {
    /// Entertainment when every category is light content, otherwise news.
    pub fn classify<'a>(categories: impl IntoIterator<Item = &'a str>) -> Self {
        if categories
            .into_iter()
            .all(|c| LIGHT_CATEGORIES.contains(&c))
        {
            Self::Entertainment
        } else {
            Self::NewsAndPolitics
        }
    }

    /// Numeric category id on the publishing service.
    pub fn service_id(self) -> &'static str {
        match self {
            Self::Entertainment => "24",
            Self::NewsAndPolitics => "25",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    #[default]
    Private,
    Unlisted,
    Public,
}

/// The terminal record of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Combined video path with `/` separators.
    pub video_path: String,
    pub timestamp: String,
    /// Seconds per clip.
    pub duration: u32,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category: ContentCategory,
    pub category_id: String,
    pub privacy_status: PrivacyStatus,
    pub news_segments: Vec<NewsItem>,
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Distinct categories in order of first appearance.
pub fn categories_in_order(items: &[NewsItem]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let cat = item.category.trim_matches(['[', ']']);
        if !out.iter().any(|c| c == cat) {
            out.push(cat.to_string());
        }
    }
    out
}

fn headline(date: &str, categories: &[String]) -> String {
    let cats = categories
        .iter()
        .map(|c| format!("#{c} News"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{date} {cats}")
}

fn compose_description(
    head: &str,
    categories: &[String],
    items: &[NewsItem],
    affiliate: &AffiliateDisclosure,
) -> String {
    let mut out = format!("{head}\n");
    if let Some(notice) = &affiliate.notice {
        out.push_str(notice);
        out.push('\n');
    }
    if let Some(link) = &affiliate.link {
        out.push_str(link);
        out.push_str("\n\n");
    }
    out.push_str(&format!("=== 오늘의 {} 뉴스 ===\n", categories.join("/")));
    for category in categories {
        out.push_str(&format!("\n[{category}]\n"));
        for item in items
            .iter()
            .filter(|i| i.category.trim_matches(['[', ']']) == category)
        {
            out.push_str(&format!("- {}\n  {}\n", item.title, item.link));
        }
    }
    out
}

/// Build the run metadata for `items` and the combined video at `video_path`.
pub fn build_metadata(
    items: &[NewsItem],
    video_path: &Path,
    stamp: &RunStamp,
    clip_secs: u32,
    affiliate: &AffiliateDisclosure,
) -> ReelResult<RunMetadata> {
    if !video_path.is_file() {
        return Err(ReelError::metadata(format!(
            "combined video missing: '{}'",
            video_path.display()
        )));
    }

    let date = stamp.started();
    let date_str = date.format("%Y년 %m월 %d일").to_string();
    let categories = categories_in_order(items);
    let head = headline(&date_str, &categories);

    let title = match &affiliate.notice {
        Some(notice) => format!("{head}   {notice}"),
        None => head.clone(),
    };
    let description = compose_description(&head, &categories, items, affiliate);
    let category = ContentCategory::classify(categories.iter().map(String::as_str));

    Ok(RunMetadata {
        video_path: video_path.to_string_lossy().replace('\\', "/"),
        timestamp: stamp.label().to_string(),
        duration: clip_secs,
        title: truncate_chars(&title, TITLE_MAX_CHARS),
        description: truncate_chars(&description, DESCRIPTION_MAX_CHARS),
        tags: tags::build_tags(&categories, date),
        category,
        category_id: category.service_id().to_string(),
        privacy_status: PrivacyStatus::default(),
        news_segments: items.to_vec(),
    })
}

/// `video_metadata_<stamp>.json`
pub fn metadata_file_name(stamp: &str) -> String {
    format!("video_metadata_{stamp}.json")
}

/// Write `meta` into `dir` atomically, then release the clips held by `handoff`.
///
/// If the write fails the handoff is dropped unreleased, so the clips stay on disk.
pub fn persist_metadata(meta: &RunMetadata, dir: &Path, handoff: ClipHandoff) -> ReelResult<PathBuf> {
    let path = dir.join(metadata_file_name(&meta.timestamp));
    let tmp = dir.join(format!("{}.tmp", metadata_file_name(&meta.timestamp)));

    let json = serde_json::to_vec_pretty(meta)
        .map_err(|e| ReelError::metadata(format!("serialize metadata: {e}")))?;
    std::fs::write(&tmp, json)
        .with_context(|| format!("write metadata temp file '{}'", tmp.display()))?;
    if let Err(err) = std::fs::rename(&tmp, &path) {
        std::fs::remove_file(&tmp).ok();
        return Err(ReelError::metadata(format!(
            "move metadata into place '{}': {err}",
            path.display()
        )));
    }

    let released = handoff.release();
    tracing::info!(path = %path.display(), released, "metadata written");
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/metadata/metadata.rs"]
mod tests;
