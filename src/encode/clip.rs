use std::path::{Path, PathBuf};

use crate::{
    encode::{command::ZoomClipSpec, process::Encoder},
    foundation::{
        context::RunContext,
        error::{ReelError, ReelResult},
    },
    render::ImageArtifact,
};

/// A zooming clip made from one card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoClip {
    pub path: PathBuf,
    pub stamp: String,
    pub category: String,
    pub title: String,
}

/// `<videos_dir>/<image stem>.mp4`
pub fn clip_output_path(image: &Path, videos_dir: &Path) -> ReelResult<PathBuf> {
    let stem = image
        .file_stem()
        .ok_or_else(|| ReelError::validation(format!("image path has no file name: '{}'", image.display())))?;
    let mut name = stem.to_os_string();
    name.push(".mp4");
    Ok(videos_dir.join(name))
}

/// Build the zoom command for `image` from the run's video settings.
pub fn zoom_spec_for(image: &ImageArtifact, ctx: &RunContext) -> ReelResult<ZoomClipSpec> {
    let video = &ctx.video;
    Ok(ZoomClipSpec {
        image: image.path.clone(),
        output: clip_output_path(&image.path, &ctx.videos_dir())?,
        duration_secs: ctx.clip_secs(),
        fps: video.fps,
        width: video.frame_width,
        height: video.frame_height,
        zoom_max: video.zoom_max,
        zoom_step: video.zoom_step,
    })
}

/// Turn one card into a clip of `clip_secs` seconds with a slow zoom.
#[tracing::instrument(skip_all, fields(image = %image.path.display()))]
pub fn synthesize_clip(
    image: &ImageArtifact,
    ctx: &RunContext,
    encoder: &dyn Encoder,
) -> ReelResult<VideoClip> {
    if !image.path.is_file() {
        return Err(ReelError::encode(format!(
            "card image missing: '{}'",
            image.path.display()
        )));
    }
    let cmd = zoom_spec_for(image, ctx)?.build()?;
    encoder.run(&cmd)?;
    tracing::debug!(clip = %cmd.output.display(), "clip synthesized");

    Ok(VideoClip {
        path: cmd.output,
        stamp: image.stamp.clone(),
        category: image.category.clone(),
        title: image.title.clone(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/clip.rs"]
mod tests;
