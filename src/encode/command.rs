//! Typed builders for the three encoder invocations: zoom clip, concat and music mix.

use std::{
    ffi::OsString,
    fmt::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// What an [`EncoderCommand`] produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    ZoomClip,
    Concat,
    AudioMix,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ZoomClip => "zoom-clip",
            Self::Concat => "concat",
            Self::AudioMix => "audio-mix",
        })
    }
}

/// A validated argument vector plus the file it is expected to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderCommand {
    pub kind: CommandKind,
    pub args: Vec<OsString>,
    pub output: PathBuf,
}

impl EncoderCommand {
    /// Arguments as UTF-8 (lossy), for logs and assertions.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

fn base_args() -> Vec<OsString> {
    ["-y", "-loglevel", "error"]
        .into_iter()
        .map(OsString::from)
        .collect()
}

/// Still image to zooming clip.
#[derive(Clone, Debug)]
pub struct ZoomClipSpec {
    pub image: PathBuf,
    pub output: PathBuf,
    pub duration_secs: u32,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub zoom_max: f64,
    pub zoom_step: f64,
}

impl ZoomClipSpec {
    pub fn validate(&self) -> ReelResult<()> {
        if self.duration_secs == 0 {
            return Err(ReelError::validation("clip duration must be non-zero"));
        }
        if self.fps == 0 {
            return Err(ReelError::validation("clip fps must be non-zero"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("clip width/height must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "clip width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if !self.zoom_max.is_finite() || self.zoom_max < 1.0 {
            return Err(ReelError::validation("zoom max must be finite and >= 1"));
        }
        if !self.zoom_step.is_finite() || self.zoom_step < 0.0 {
            return Err(ReelError::validation("zoom step must be finite and >= 0"));
        }
        Ok(())
    }

    /// `scale` pre-enlarges the frame so `zoompan` has headroom; `d` is the frame count.
    pub fn filter(&self) -> String {
        let frames = u64::from(self.duration_secs) * u64::from(self.fps);
        format!(
            "scale=iw*{zmax}:-1,zoompan=z='min(zoom+{step},{zmax})':d={frames}:s={w}x{h}:fps={fps}",
            zmax = self.zoom_max,
            step = self.zoom_step,
            w = self.width,
            h = self.height,
            fps = self.fps,
        )
    }

    pub fn build(&self) -> ReelResult<EncoderCommand> {
        self.validate()?;
        let mut args = base_args();
        args.push("-i".into());
        args.push(self.image.clone().into_os_string());
        args.push("-vf".into());
        args.push(self.filter().into());
        args.push("-t".into());
        args.push(self.duration_secs.to_string().into());
        args.push("-r".into());
        args.push(self.fps.to_string().into());
        for a in ["-c:v", "libx264", "-pix_fmt", "yuv420p"] {
            args.push(a.into());
        }
        args.push(self.output.clone().into_os_string());
        Ok(EncoderCommand {
            kind: CommandKind::ZoomClip,
            args,
            output: self.output.clone(),
        })
    }
}

/// Stream-copy concatenation driven by a list file.
#[derive(Clone, Debug)]
pub struct ConcatSpec {
    pub list_file: PathBuf,
    pub output: PathBuf,
}

impl ConcatSpec {
    pub fn build(&self) -> ReelResult<EncoderCommand> {
        if self.list_file.as_os_str().is_empty() {
            return Err(ReelError::validation("concat list path must be non-empty"));
        }
        let mut args = base_args();
        for a in ["-f", "concat", "-safe", "0", "-i"] {
            args.push(a.into());
        }
        args.push(self.list_file.clone().into_os_string());
        args.push("-c".into());
        args.push("copy".into());
        args.push(self.output.clone().into_os_string());
        Ok(EncoderCommand {
            kind: CommandKind::Concat,
            args,
            output: self.output.clone(),
        })
    }
}

/// Lays looped background music under a video with fade in/out.
#[derive(Clone, Debug)]
pub struct AudioMixSpec {
    pub video: PathBuf,
    pub music: PathBuf,
    pub output: PathBuf,
    pub total_secs: f64,
    pub seek_secs: f64,
    pub volume: f64,
    pub fade_secs: f64,
    pub bitrate: String,
}

impl AudioMixSpec {
    /// Fade-out start, clamped so short videos never get a negative offset.
    pub fn fade_out_start(&self) -> f64 {
        (self.total_secs - self.fade_secs).max(0.0)
    }

    pub fn filter(&self) -> String {
        format!(
            "[1:a]volume={vol},afade=t=in:st=0:d={fade},afade=t=out:st={out}:d={fade}[a]",
            vol = self.volume,
            fade = self.fade_secs,
            out = self.fade_out_start(),
        )
    }

    pub fn build(&self) -> ReelResult<EncoderCommand> {
        for (name, v) in [
            ("total duration", self.total_secs),
            ("music seek", self.seek_secs),
            ("music volume", self.volume),
            ("fade", self.fade_secs),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ReelError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if self.total_secs == 0.0 {
            return Err(ReelError::validation("total duration must be non-zero"));
        }

        let mut args = base_args();
        args.push("-i".into());
        args.push(self.video.clone().into_os_string());
        for a in ["-stream_loop", "-1", "-ss"] {
            args.push(a.into());
        }
        args.push(self.seek_secs.to_string().into());
        args.push("-i".into());
        args.push(self.music.clone().into_os_string());
        args.push("-filter_complex".into());
        args.push(self.filter().into());
        for a in ["-map", "0:v", "-map", "[a]", "-t"] {
            args.push(a.into());
        }
        args.push(self.total_secs.to_string().into());
        for a in ["-shortest", "-c:v", "copy", "-c:a", "aac", "-b:a"] {
            args.push(a.into());
        }
        args.push(self.bitrate.clone().into());
        args.push(self.output.clone().into_os_string());
        Ok(EncoderCommand {
            kind: CommandKind::AudioMix,
            args,
            output: self.output.clone(),
        })
    }
}

/// Render the concat demuxer list: one `file '<abs path>'` line per clip, `/` separators,
/// single quotes escaped as `'\''`.
pub fn concat_list_contents(clips: &[PathBuf]) -> ReelResult<String> {
    let mut out = String::new();
    for clip in clips {
        let abs = std::path::absolute(clip)
            .with_context(|| format!("resolve absolute path of '{}'", clip.display()))?;
        let normalized = abs.to_string_lossy().replace('\\', "/");
        let escaped = normalized.replace('\'', r"'\''");
        let _ = writeln!(out, "file '{escaped}'");
    }
    Ok(out)
}

/// Write the concat list for `clips` to `path`.
pub fn write_concat_list(path: &Path, clips: &[PathBuf]) -> ReelResult<()> {
    let contents = concat_list_contents(clips)?;
    std::fs::write(path, contents)
        .with_context(|| format!("write concat list '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/command.rs"]
mod tests;
