//! End-to-end run: collect, render, clip, combine, describe, sweep.

use std::path::PathBuf;

use crate::{
    collect::{FeedSource, NewsItem, collect_news},
    encode::{
        Encoder,
        clip::{VideoClip, synthesize_clip},
        combine::combine_clips,
        probe::{duration_matches, probe_duration_secs},
    },
    foundation::{
        context::RunContext,
        error::{ReelError, ReelResult},
    },
    metadata::{build_metadata, persist_metadata},
    render::{CardBackend, ImageArtifact},
    retention::{SweepReport, sweep_retained},
};

/// Allowed drift between the nominal and probed combined duration, in seconds.
pub const DURATION_TOLERANCE_SECS: f64 = 0.5;

/// Counts and outputs of one successful run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub stamp: String,
    pub items: usize,
    pub images: usize,
    pub clips: usize,
    pub combined: PathBuf,
    pub audio_mixed: bool,
    pub metadata: PathBuf,
    pub images_sweep: SweepReport,
    pub videos_sweep: SweepReport,
}

/// One run over fixed collaborators.
pub struct Pipeline<'a> {
    ctx: RunContext,
    feed: &'a dyn FeedSource,
    cards: &'a mut dyn CardBackend,
    encoder: &'a dyn Encoder,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        ctx: RunContext,
        feed: &'a dyn FeedSource,
        cards: &'a mut dyn CardBackend,
        encoder: &'a dyn Encoder,
    ) -> Self {
        Self {
            ctx,
            feed,
            cards,
            encoder,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    fn collect(&self) -> ReelResult<Vec<NewsItem>> {
        let _span = tracing::info_span!("collect").entered();
        let cfg = &self.ctx.config;
        collect_news(&cfg.feeds, cfg.limits, &cfg.publisher, self.feed)
    }

    fn render(&mut self, items: &[NewsItem]) -> ReelResult<Vec<ImageArtifact>> {
        let _span = tracing::info_span!("render", items = items.len()).entered();
        let out_dir = self.ctx.images_dir();
        let mut images = Vec::with_capacity(items.len());
        for item in items {
            match self.cards.render_card(item, &out_dir, &self.ctx.stamp) {
                Ok(image) => images.push(image),
                Err(err) => tracing::warn!(id = item.id, error = %err, "card skipped"),
            }
        }
        if images.is_empty() {
            return Err(ReelError::render("no card could be rendered"));
        }
        tracing::info!(rendered = images.len(), "cards rendered");
        Ok(images)
    }

    fn clips(&self, images: &[ImageArtifact]) -> ReelResult<Vec<VideoClip>> {
        let _span = tracing::info_span!("clip", images = images.len()).entered();
        let mut clips = Vec::with_capacity(images.len());
        for image in images {
            match synthesize_clip(image, &self.ctx, self.encoder) {
                Ok(clip) => clips.push(clip),
                Err(err) => {
                    tracing::warn!(image = %image.path.display(), error = %err, "clip skipped")
                }
            }
        }
        if clips.is_empty() {
            return Err(ReelError::encode("no clip could be synthesized"));
        }
        tracing::info!(clips = clips.len(), "clips synthesized");
        Ok(clips)
    }

    fn check_duration(&self, path: &std::path::Path, expected: f64) {
        let Some(ffprobe) = &self.ctx.encoder.ffprobe else {
            return;
        };
        match probe_duration_secs(ffprobe, path) {
            Ok(actual) if !duration_matches(expected, actual, DURATION_TOLERANCE_SECS) => {
                tracing::warn!(expected, actual, "combined duration deviates from clip total")
            }
            Ok(actual) => tracing::debug!(expected, actual, "combined duration verified"),
            Err(err) => tracing::warn!(error = %err, "could not probe combined duration"),
        }
    }

    /// Execute every stage in order. Item-level render and clip failures are skipped; a stage
    /// that yields nothing, or any other stage failure, ends the run with that error.
    pub fn run(mut self) -> ReelResult<RunSummary> {
        let _span = tracing::info_span!("run", stamp = %self.ctx.stamp).entered();
        self.ctx.prepare_dirs()?;

        let items = self.collect()?;
        let images = self.render(&items)?;
        let clips = self.clips(&images)?;

        let clip_paths: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();
        let (video, handoff) = {
            let _span = tracing::info_span!("combine", clips = clip_paths.len()).entered();
            combine_clips(&clip_paths, &self.ctx, self.encoder)?
        };
        self.check_duration(&video.path, video.total_secs);

        let metadata = {
            let _span = tracing::info_span!("metadata").entered();
            let meta = build_metadata(
                &items,
                &video.path,
                &self.ctx.stamp,
                self.ctx.clip_secs(),
                &self.ctx.config.affiliate,
            )?;
            persist_metadata(&meta, &self.ctx.videos_dir(), handoff)?
        };

        let (images_sweep, videos_sweep) = {
            let _span = tracing::info_span!("sweep").entered();
            let max = self.ctx.max_retained_dirs;
            (
                sweep_retained(&self.ctx.layout.images_root(), max),
                sweep_retained(&self.ctx.layout.videos_root(), max),
            )
        };

        let summary = RunSummary {
            stamp: self.ctx.stamp.label().to_string(),
            items: items.len(),
            images: images.len(),
            clips: clips.len(),
            combined: video.path,
            audio_mixed: video.audio_mixed,
            metadata,
            images_sweep,
            videos_sweep,
        };
        tracing::info!(
            items = summary.items,
            images = summary.images,
            clips = summary.clips,
            combined = %summary.combined.display(),
            "run complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
