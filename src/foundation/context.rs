//! Run-scoped, immutable context handed to every stage.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Local};

use crate::{
    config::manifest::PipelineConfig,
    encode::process::EncoderSettings,
    foundation::error::{ReelError, ReelResult},
};

/// Card background template expected under the assets directory.
pub const CARD_TEMPLATE_FILE: &str = "card_01_1080x1560.png";
/// Optional background music expected under the assets directory.
pub const MUSIC_FILE: &str = "bgm.mp3";
/// Default manifest location under the assets directory.
pub const MANIFEST_FILE: &str = "RSS.txt";

/// Identity of one run: the local start time and its `YYYYMMDD_HHMM` label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunStamp {
    label: String,
    started: DateTime<Local>,
}

impl RunStamp {
    /// Stamp the current local time.
    pub fn now() -> Self {
        Self::from_datetime(Local::now())
    }

    /// Stamp a specific local time (tests, replays).
    pub fn from_datetime(started: DateTime<Local>) -> Self {
        Self {
            label: started.format("%Y%m%d_%H%M").to_string(),
            started,
        }
    }

    /// `YYYYMMDD_HHMM` label embedded in directory and file names.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Local start time of the run.
    pub fn started(&self) -> DateTime<Local> {
        self.started
    }
}

impl std::fmt::Display for RunStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

/// Filesystem layout shared by all runs.
///
/// Per-run outputs live in `<base>/images/<stamp>` and `<base>/videos/<stamp>`; the retention
/// sweeper operates on the `images` and `videos` roots.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    /// Root of all run outputs.
    pub base_dir: PathBuf,
    /// Static assets: template, music, fonts, manifest.
    pub assets_dir: PathBuf,
    /// Scratch space for run-scoped temporaries.
    pub temp_dir: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `base_dir`, reading assets from `assets_dir`.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        assets_dir: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            assets_dir: assets_dir.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Parent of every per-run image directory.
    pub fn images_root(&self) -> PathBuf {
        self.base_dir.join("images")
    }

    /// Parent of every per-run video directory.
    pub fn videos_root(&self) -> PathBuf {
        self.base_dir.join("videos")
    }

    /// Card output directory for `stamp`.
    pub fn run_images_dir(&self, stamp: &RunStamp) -> PathBuf {
        self.images_root().join(stamp.label())
    }

    /// Clip, combined video, and metadata directory for `stamp`.
    pub fn run_videos_dir(&self, stamp: &RunStamp) -> PathBuf {
        self.videos_root().join(stamp.label())
    }

    /// Card background template path.
    pub fn template_path(&self) -> PathBuf {
        self.assets_dir.join(CARD_TEMPLATE_FILE)
    }

    /// Background music path (may not exist).
    pub fn music_path(&self) -> PathBuf {
        self.assets_dir.join(MUSIC_FILE)
    }

    /// Default manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.assets_dir.join(MANIFEST_FILE)
    }

    fn create_dirs(&self, stamp: &RunStamp) -> ReelResult<()> {
        for dir in [
            self.run_images_dir(stamp),
            self.run_videos_dir(stamp),
            self.temp_dir.clone(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create run directory '{}'", dir.display()))?;
        }
        Ok(())
    }
}

/// Background music mixing parameters.
#[derive(Clone, Debug)]
pub struct MusicSettings {
    /// Seconds skipped at the start of the music track.
    pub seek_secs: f64,
    /// Linear volume scale applied to the music.
    pub volume: f64,
    /// Fade-in and fade-out length in seconds.
    pub fade_secs: f64,
    /// AAC bitrate passed to the encoder.
    pub bitrate: String,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            seek_secs: 9.0,
            volume: 0.352,
            fade_secs: 1.0,
            bitrate: "192k".to_string(),
        }
    }
}

/// Clip output parameters.
#[derive(Clone, Debug)]
pub struct VideoSettings {
    /// Output frame rate of every clip.
    pub fps: u32,
    /// Upper bound of the zoom factor.
    pub zoom_max: f64,
    /// Zoom increment per output frame.
    pub zoom_step: f64,
    /// Output frame width.
    pub frame_width: u32,
    /// Output frame height.
    pub frame_height: u32,
    /// Music mix parameters.
    pub music: MusicSettings,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            fps: 25,
            zoom_max: 1.1,
            zoom_step: 0.0015,
            frame_width: 1080,
            frame_height: 1920,
            music: MusicSettings::default(),
        }
    }
}

/// Everything a stage may read, built once per run and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct RunContext {
    /// Run identity.
    pub stamp: RunStamp,
    /// Where inputs come from and outputs go.
    pub layout: OutputLayout,
    /// Resolved manifest values.
    pub config: PipelineConfig,
    /// Clip and mix parameters.
    pub video: VideoSettings,
    /// Resolved encoder binaries and process policy.
    pub encoder: EncoderSettings,
    /// Maximum number of per-run directories kept under each output root.
    pub max_retained_dirs: usize,
}

impl RunContext {
    /// Assemble a context with default video settings and retention of two runs.
    pub fn new(
        stamp: RunStamp,
        layout: OutputLayout,
        config: PipelineConfig,
        encoder: EncoderSettings,
    ) -> Self {
        Self {
            stamp,
            layout,
            config,
            video: VideoSettings::default(),
            encoder,
            max_retained_dirs: 2,
        }
    }

    /// Create the per-run output directories and the temp directory.
    pub fn prepare_dirs(&self) -> ReelResult<()> {
        if self.max_retained_dirs == 0 {
            return Err(ReelError::validation(
                "max_retained_dirs must be at least 1 (the current run)",
            ));
        }
        self.layout.create_dirs(&self.stamp)
    }

    /// Card output directory of this run.
    pub fn images_dir(&self) -> PathBuf {
        self.layout.run_images_dir(&self.stamp)
    }

    /// Video and metadata directory of this run.
    pub fn videos_dir(&self) -> PathBuf {
        self.layout.run_videos_dir(&self.stamp)
    }

    /// Per-clip duration in seconds.
    pub fn clip_secs(&self) -> u32 {
        self.config.clip_secs
    }

    /// Scratch directory for run-scoped temporaries.
    pub fn temp_dir(&self) -> &Path {
        &self.layout.temp_dir
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/context.rs"]
mod tests;
