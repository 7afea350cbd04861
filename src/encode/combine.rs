//! Concatenation of clips into the run's final video, optionally under background music.

use std::path::{Path, PathBuf};

use crate::{
    encode::{
        command::{AudioMixSpec, ConcatSpec, write_concat_list},
        process::{Encoder, ensure_parent_dir},
    },
    foundation::{
        context::RunContext,
        error::{ReelError, ReelResult},
    },
};

/// The combined output of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct CombinedVideo {
    pub path: PathBuf,
    pub clip_count: usize,
    /// Nominal duration: clip count times clip length.
    pub total_secs: f64,
    pub audio_mixed: bool,
}

/// Ownership of the per-clip files once they have been combined.
///
/// The clips stay on disk until [`ClipHandoff::release`] is called, which should happen only
/// after everything that references them has been persisted. Dropping the handoff keeps them.
#[must_use = "clips are only deleted by ClipHandoff::release"]
#[derive(Debug)]
pub struct ClipHandoff {
    clips: Vec<PathBuf>,
}

impl ClipHandoff {
    pub fn new(clips: Vec<PathBuf>) -> Self {
        Self { clips }
    }

    pub fn clips(&self) -> &[PathBuf] {
        &self.clips
    }

    /// Delete the clip files. Returns how many were removed; failures are logged.
    pub fn release(self) -> usize {
        let mut removed = 0;
        for clip in &self.clips {
            match std::fs::remove_file(clip) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(path = %clip.display(), error = %err, "failed to remove clip")
                }
            }
        }
        tracing::debug!(removed, "clips released");
        removed
    }
}

/// Removes run-scoped temporaries when dropped, whatever the exit path.
struct TempFiles {
    paths: Vec<PathBuf>,
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            if !path.exists() {
                continue;
            }
            if let Err(err) = std::fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove temp file");
            }
        }
    }
}

/// `combined_news_<stamp>.mp4`
pub fn combined_file_name(stamp: &str) -> String {
    format!("combined_news_{stamp}.mp4")
}

fn move_into_place(from: &Path, to: &Path) -> ReelResult<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).map_err(|e| {
        ReelError::encode(format!(
            "failed to move '{}' to '{}': {e}",
            from.display(),
            to.display()
        ))
    })?;
    if let Err(err) = std::fs::remove_file(from) {
        tracing::warn!(path = %from.display(), error = %err, "failed to remove moved temp file");
    }
    Ok(())
}

/// Concatenate `clips` in order and, when the run's music file exists, mix it underneath.
///
/// Every clip must exist before any encoder work starts. A failed music mix falls back to the
/// silent concatenation rather than failing the run.
#[tracing::instrument(skip_all, fields(clips = clips.len()))]
pub fn combine_clips(
    clips: &[PathBuf],
    ctx: &RunContext,
    encoder: &dyn Encoder,
) -> ReelResult<(CombinedVideo, ClipHandoff)> {
    if clips.is_empty() {
        return Err(ReelError::validation("no clips to combine"));
    }
    if let Some(missing) = clips.iter().find(|c| !c.is_file()) {
        return Err(ReelError::encode(format!(
            "clip missing before combine: '{}'",
            missing.display()
        )));
    }

    let stamp = ctx.stamp.label();
    let temp_dir = ctx.temp_dir();
    std::fs::create_dir_all(temp_dir).map_err(|e| {
        ReelError::encode(format!(
            "failed to create temp dir '{}': {e}",
            temp_dir.display()
        ))
    })?;
    let list_file = temp_dir.join(format!("video_list_{stamp}.txt"));
    let temp_combined = temp_dir.join(format!("temp_{}", combined_file_name(stamp)));
    let final_path = ctx.videos_dir().join(combined_file_name(stamp));
    ensure_parent_dir(&final_path)?;
    let _temps = TempFiles {
        paths: vec![list_file.clone(), temp_combined.clone()],
    };

    write_concat_list(&list_file, clips)?;
    let concat = ConcatSpec {
        list_file: list_file.clone(),
        output: temp_combined.clone(),
    }
    .build()?;
    encoder.run(&concat)?;

    let total_secs = clips.len() as f64 * f64::from(ctx.clip_secs());
    let music = ctx.layout.music_path();
    let mut audio_mixed = false;

    if music.is_file() {
        let m = &ctx.video.music;
        let mix = AudioMixSpec {
            video: temp_combined.clone(),
            music,
            output: final_path.clone(),
            total_secs,
            seek_secs: m.seek_secs,
            volume: m.volume,
            fade_secs: m.fade_secs,
            bitrate: m.bitrate.clone(),
        }
        .build()?;
        match encoder.run(&mix) {
            Ok(()) => audio_mixed = true,
            Err(err) => {
                tracing::warn!(error = %err, "music mix failed, keeping silent video");
                move_into_place(&temp_combined, &final_path)?;
            }
        }
    } else {
        tracing::info!(music = %music.display(), "no background music, skipping mix");
        move_into_place(&temp_combined, &final_path)?;
    }

    if !final_path.is_file() {
        return Err(ReelError::encode(format!(
            "combined video was not created: '{}'",
            final_path.display()
        )));
    }
    tracing::info!(path = %final_path.display(), total_secs, audio_mixed, "clips combined");

    Ok((
        CombinedVideo {
            path: final_path,
            clip_count: clips.len(),
            total_secs,
            audio_mixed,
        },
        ClipHandoff::new(clips.to_vec()),
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/combine.rs"]
mod tests;
