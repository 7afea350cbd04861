//! External encoder integration: command construction, process supervision, clip synthesis,
//! combining and probing.

pub mod clip;
pub mod combine;
pub mod command;
pub mod probe;
pub mod process;

pub use clip::{VideoClip, synthesize_clip};
pub use combine::{ClipHandoff, CombinedVideo, combine_clips};
pub use command::{AudioMixSpec, CommandKind, ConcatSpec, EncoderCommand, ZoomClipSpec};
pub use probe::probe_duration_secs;
pub use process::{Encoder, EncoderSettings, FfmpegProcess};
