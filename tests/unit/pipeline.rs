use std::path::Path;

use super::*;
use crate::{
    collect::FeedEntry,
    config::{CollectLimits, FeedSpec},
    encode::command::CommandKind,
    foundation::context::RunStamp,
    metadata::{ContentCategory, RunMetadata},
    test_support::{RecordingEncoder, context_in, temp_dir},
};

struct TwoFeeds;

impl FeedSource for TwoFeeds {
    fn fetch(&self, url: &str) -> ReelResult<Vec<FeedEntry>> {
        let tag = if url.contains("sports") { "s" } else { "w" };
        Ok((0..3)
            .map(|i| FeedEntry {
                title: format!("{tag} 제목 {i}"),
                description: Some(format!("{tag} 요약 {i}")),
                link: format!("https://news.example/{tag}/{i}"),
                author: None,
                published: None,
            })
            .collect())
    }
}

/// Writes a placeholder file per card, failing ids listed in `fail_ids`.
#[derive(Default)]
struct StubCards {
    fail_ids: Vec<u32>,
}

impl CardBackend for StubCards {
    fn render_card(
        &mut self,
        item: &NewsItem,
        out_dir: &Path,
        stamp: &RunStamp,
    ) -> ReelResult<ImageArtifact> {
        if self.fail_ids.contains(&item.id) {
            return Err(ReelError::render("template missing (test)"));
        }
        let path = out_dir.join(crate::render::card_file_name(item, stamp));
        std::fs::write(&path, b"png").unwrap();
        Ok(ImageArtifact {
            path,
            stamp: stamp.label().to_string(),
            category: item.category.clone(),
            title: item.title.clone(),
        })
    }
}

fn scenario_ctx(root: &Path) -> RunContext {
    let mut ctx = context_in(root);
    ctx.config.feeds = vec![
        FeedSpec::new("Sports", "https://a/rss/sports.xml"),
        FeedSpec::new("World", "https://a/rss/world.xml"),
    ];
    ctx.config.limits = CollectLimits {
        per_category: 3,
        total: 6,
    };
    ctx
}

#[test]
fn two_categories_three_items_each() {
    let root = temp_dir("pipeline_scenario");
    let ctx = scenario_ctx(&root);
    let videos_dir = ctx.videos_dir();
    let mut cards = StubCards::default();
    let enc = RecordingEncoder::default();

    let summary = Pipeline::new(ctx, &TwoFeeds, &mut cards, &enc).run().unwrap();

    assert_eq!((summary.items, summary.images, summary.clips), (6, 6, 6));
    let kinds = enc.kinds();
    assert_eq!(kinds.iter().filter(|k| **k == CommandKind::ZoomClip).count(), 6);
    assert_eq!(kinds.last(), Some(&CommandKind::Concat));

    let meta: RunMetadata =
        serde_json::from_slice(&std::fs::read(&summary.metadata).unwrap()).unwrap();
    assert_eq!(meta.category, ContentCategory::NewsAndPolitics);
    let ids: Vec<u32> = meta.news_segments.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(meta.news_segments[2].category, "Sports");
    assert_eq!(meta.news_segments[3].category, "World");
    let mut sorted = meta.tags.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(meta.tags, sorted);

    // Clips are released after the metadata is written; the combined video stays.
    let leftover_clips = std::fs::read_dir(&videos_dir)
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("news_"))
        .count();
    assert_eq!(leftover_clips, 0);
    assert!(summary.combined.is_file());
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn failed_cards_are_skipped() {
    let root = temp_dir("pipeline_partial");
    let ctx = scenario_ctx(&root);
    let mut cards = StubCards {
        fail_ids: vec![2, 5],
    };
    let enc = RecordingEncoder::default();
    let summary = Pipeline::new(ctx, &TwoFeeds, &mut cards, &enc).run().unwrap();
    assert_eq!((summary.items, summary.images, summary.clips), (6, 4, 4));
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn no_rendered_card_is_fatal() {
    let root = temp_dir("pipeline_no_cards");
    let ctx = scenario_ctx(&root);
    let mut cards = StubCards {
        fail_ids: (1..=6).collect(),
    };
    let enc = RecordingEncoder::default();
    let err = Pipeline::new(ctx, &TwoFeeds, &mut cards, &enc).run().unwrap_err();
    assert!(matches!(err, ReelError::Render(_)));
    assert!(enc.calls.borrow().is_empty());
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn no_clip_is_fatal() {
    let root = temp_dir("pipeline_no_clips");
    let ctx = scenario_ctx(&root);
    let mut cards = StubCards::default();
    let enc = RecordingEncoder::failing(&[CommandKind::ZoomClip]);
    let err = Pipeline::new(ctx, &TwoFeeds, &mut cards, &enc).run().unwrap_err();
    assert!(matches!(err, ReelError::Encode(_)));
    assert!(!enc.kinds().contains(&CommandKind::Concat));
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn old_runs_are_swept() {
    let root = temp_dir("pipeline_sweep");
    let ctx = scenario_ctx(&root);
    for old in ["20260101_0000", "20260102_0000"] {
        std::fs::create_dir_all(ctx.layout.videos_root().join(old)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(30));
    }
    std::thread::sleep(std::time::Duration::from_millis(30));
    // The current run's directory must be the newest.
    std::fs::remove_dir_all(ctx.videos_dir()).unwrap();
    std::fs::create_dir_all(ctx.videos_dir()).unwrap();

    let mut cards = StubCards::default();
    let enc = RecordingEncoder::default();
    let summary = Pipeline::new(ctx.clone(), &TwoFeeds, &mut cards, &enc)
        .run()
        .unwrap();
    assert_eq!(summary.videos_sweep.removed.len(), 1);
    assert!(ctx.videos_dir().exists());
    assert!(!ctx.layout.videos_root().join("20260101_0000").exists());
    std::fs::remove_dir_all(&root).ok();
}
