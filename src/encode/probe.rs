use std::{path::Path, process::Command};

use crate::foundation::error::{ReelError, ReelResult};

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    format: ProbeFormat,
}

/// Container duration in seconds as reported by `ffprobe -show_format`.
pub fn probe_duration_secs(ffprobe: &Path, media: &Path) -> ReelResult<f64> {
    let out = Command::new(ffprobe)
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(media)
        .output()
        .map_err(|e| ReelError::encode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::encode(format!(
            "ffprobe failed for '{}': {}",
            media.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_duration(&out.stdout)
}

fn parse_probe_duration(stdout: &[u8]) -> ReelResult<f64> {
    let parsed: ProbeOut = serde_json::from_slice(stdout)
        .map_err(|e| ReelError::encode(format!("ffprobe json parse failed: {e}")))?;
    let raw = parsed
        .format
        .duration
        .ok_or_else(|| ReelError::encode("missing format duration from ffprobe"))?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ReelError::encode(format!("invalid ffprobe duration '{raw}'")))
}

/// Whether `actual` is within `tolerance` seconds of `expected`.
pub fn duration_matches(expected: f64, actual: f64, tolerance: f64) -> bool {
    (expected - actual).abs() <= tolerance
}

#[cfg(test)]
#[path = "../../tests/unit/encode/probe.rs"]
mod tests;
