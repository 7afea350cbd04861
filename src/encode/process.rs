//! Running the external encoder with a timeout and bounded retries.

use std::{
    io::Read as _,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    time::{Duration, Instant},
};

use crate::{
    encode::command::EncoderCommand,
    foundation::error::{ReelError, ReelResult},
};

/// Executes [`EncoderCommand`]s. Succeeds only when the command's output file exists afterwards.
pub trait Encoder {
    fn run(&self, cmd: &EncoderCommand) -> ReelResult<()>;
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STDERR_TAIL_CHARS: usize = 2000;

/// [`Encoder`] that spawns an ffmpeg-compatible binary.
#[derive(Clone, Debug)]
pub struct FfmpegProcess {
    pub program: PathBuf,
    pub timeout: Duration,
    pub attempts: u32,
}

enum Outcome {
    Exited(ExitStatus, Vec<u8>),
    TimedOut,
}

impl FfmpegProcess {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: EncoderSettings::DEFAULT_TIMEOUT,
            attempts: EncoderSettings::DEFAULT_ATTEMPTS,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    fn run_once(&self, cmd: &EncoderCommand) -> ReelResult<Outcome> {
        let mut child = Command::new(&self.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelError::encode(format!(
                    "failed to spawn '{}' for {}: {e}",
                    self.program.display(),
                    cmd.kind
                ))
            })?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encode("failed to open encoder stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok::<_, std::io::Error>(stderr_bytes)
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    child.kill().ok();
                    child.wait().ok();
                    stderr_drain.join().ok();
                    return Ok(Outcome::TimedOut);
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(ReelError::encode(format!(
                        "failed to wait for {}: {e}",
                        cmd.kind
                    )));
                }
            }
        };

        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| ReelError::encode("encoder stderr drain thread panicked"))?
            .map_err(|e| ReelError::encode(format!("encoder stderr read failed: {e}")))?;
        Ok(Outcome::Exited(status, stderr_bytes))
    }
}

fn stderr_tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - STDERR_TAIL_CHARS).collect();
    format!("...{tail}")
}

fn remove_partial(path: &Path) {
    if path.exists()
        && let Err(err) = std::fs::remove_file(path)
    {
        tracing::warn!(path = %path.display(), error = %err, "failed to remove partial output");
    }
}

impl Encoder for FfmpegProcess {
    #[tracing::instrument(skip_all, fields(kind = %cmd.kind, output = %cmd.output.display()))]
    fn run(&self, cmd: &EncoderCommand) -> ReelResult<()> {
        ensure_parent_dir(&cmd.output)?;
        let attempts = self.attempts.max(1);

        for attempt in 1..=attempts {
            tracing::debug!(attempt, args = ?cmd.args_lossy(), "encoder started");
            match self.run_once(cmd)? {
                Outcome::Exited(status, stderr) => {
                    if !status.success() {
                        return Err(ReelError::encode(format!(
                            "{} exited with status {}: {}",
                            cmd.kind,
                            status,
                            stderr_tail(&stderr)
                        )));
                    }
                    if !cmd.output.exists() {
                        return Err(ReelError::encode(format!(
                            "{} finished but produced no output at '{}'",
                            cmd.kind,
                            cmd.output.display()
                        )));
                    }
                    return Ok(());
                }
                Outcome::TimedOut => {
                    tracing::warn!(
                        attempt,
                        attempts,
                        timeout_secs = self.timeout.as_secs_f64(),
                        "encoder timed out, killed"
                    );
                    remove_partial(&cmd.output);
                }
            }
        }

        Err(ReelError::encode(format!(
            "{} timed out after {attempts} attempt(s) of {:.1}s",
            cmd.kind,
            self.timeout.as_secs_f64()
        )))
    }
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Resolved encoder binaries and process policy, fixed for the run.
#[derive(Clone, Debug)]
pub struct EncoderSettings {
    pub ffmpeg: PathBuf,
    pub ffprobe: Option<PathBuf>,
    pub timeout: Duration,
    pub attempts: u32,
}

impl EncoderSettings {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
    pub const DEFAULT_ATTEMPTS: u32 = 2;

    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: None,
            timeout: Self::DEFAULT_TIMEOUT,
            attempts: Self::DEFAULT_ATTEMPTS,
        }
    }

    /// Resolve ffmpeg: `explicit`, then `PATH`, then well-known install locations. ffprobe is
    /// looked up next to ffmpeg, then on `PATH`, and is optional.
    pub fn discover(explicit: Option<&Path>) -> ReelResult<Self> {
        let ffmpeg = match explicit {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(path) => {
                return Err(ReelError::config(format!(
                    "ffmpeg not found at '{}'",
                    path.display()
                )));
            }
            None => which::which("ffmpeg")
                .ok()
                .or_else(|| well_known_ffmpeg_paths().into_iter().find(|p| p.is_file()))
                .ok_or_else(|| {
                    ReelError::config("ffmpeg not found on PATH or in well-known locations")
                })?,
        };

        let ffprobe = sibling_ffprobe(&ffmpeg).or_else(|| which::which("ffprobe").ok());
        if ffprobe.is_none() {
            tracing::warn!("ffprobe not found, duration checks disabled");
        }
        tracing::info!(
            ffmpeg = %ffmpeg.display(),
            ffprobe = ?ffprobe.as_ref().map(|p| p.display().to_string()),
            "encoder resolved"
        );

        Ok(Self {
            ffprobe,
            ..Self::new(ffmpeg)
        })
    }

    pub fn process(&self) -> FfmpegProcess {
        FfmpegProcess::new(&self.ffmpeg)
            .with_timeout(self.timeout)
            .with_attempts(self.attempts)
    }
}

fn sibling_ffprobe(ffmpeg: &Path) -> Option<PathBuf> {
    let name = if cfg!(windows) {
        "ffprobe.exe"
    } else {
        "ffprobe"
    };
    let candidate = ffmpeg.parent()?.join(name);
    candidate.is_file().then_some(candidate)
}

/// Install locations checked when ffmpeg is not on `PATH`.
pub fn well_known_ffmpeg_paths() -> Vec<PathBuf> {
    if cfg!(windows) {
        let mut paths = vec![
            PathBuf::from(r"C:\ffmpeg\bin\ffmpeg.exe"),
            PathBuf::from(r"D:\ffmpeg\bin\ffmpeg.exe"),
        ];
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join("ffmpeg").join("bin").join("ffmpeg.exe"));
        }
        paths
    } else {
        ["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/opt/homebrew/bin/ffmpeg"]
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/process.rs"]
mod tests;
