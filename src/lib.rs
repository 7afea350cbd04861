#![forbid(unsafe_code)]
//! Turns news feeds into rendered cards, zooming clips and one music-backed video, plus the
//! metadata needed to publish it.
//!
//! A run is driven by [`Pipeline`]: collect items from the configured feeds, render one card per
//! item, turn each card into a clip with an external encoder, combine the clips, write the
//! metadata record, then sweep old run directories.

pub mod collect;
pub mod config;
pub mod encode;
pub mod foundation;
pub mod metadata;
pub mod pipeline;
pub mod render;
pub mod retention;

pub use collect::{FeedEntry, FeedSource, NewsItem, RssFeedSource, collect_news};
pub use config::{PipelineConfig, load_manifest, parse_manifest};
pub use encode::{
    ClipHandoff, CombinedVideo, Encoder, EncoderCommand, EncoderSettings, FfmpegProcess,
    VideoClip, combine_clips, synthesize_clip,
};
pub use foundation::{
    context::{OutputLayout, RunContext, RunStamp, VideoSettings},
    error::{ReelError, ReelResult},
    logging::{LoggingConfig, init_logging},
};
pub use metadata::{RunMetadata, build_metadata, persist_metadata};
pub use pipeline::{Pipeline, RunSummary};
pub use render::{CardBackend, CardRenderer, ImageArtifact, wrap_text};
pub use retention::{SweepReport, sweep_retained};

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;
