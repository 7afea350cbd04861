//! Keeps only the newest per-run directories under an output root.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::SystemTime,
};

/// What a sweep did.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SweepReport {
    pub kept: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

fn created_at(path: &Path) -> Option<SystemTime> {
    let meta = std::fs::symlink_metadata(path).ok()?;
    meta.created().or_else(|_| meta.modified()).ok()
}

fn widen_permissions(dir: &Path) {
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            // Links are removed as links; their targets are outside the sweep.
            let Ok(kind) = entry.file_type() else {
                continue;
            };
            if kind.is_symlink() {
                continue;
            }
            let path = entry.path();
            if kind.is_dir() {
                stack.push(path.clone());
            }
            if let Err(err) = make_writable(&path) {
                tracing::debug!(path = %path.display(), error = %err, "could not widen permissions");
            }
        }
    }
}

#[cfg(unix)]
fn make_writable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt as _;
    let mut perms = std::fs::symlink_metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o200);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(path: &Path) -> std::io::Result<()> {
    let mut perms = std::fs::symlink_metadata(path)?.permissions();
    perms.set_readonly(false);
    std::fs::set_permissions(path, perms)
}

fn force_remove(dir: &Path) -> bool {
    let status = if cfg!(windows) {
        Command::new("cmd")
            .args(["/C", "rd", "/s", "/q"])
            .arg(dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
    } else {
        Command::new("rm")
            .arg("-rf")
            .arg(dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
    };
    status.map(|s| s.success()).unwrap_or(false) && !dir.exists()
}

fn remove_run_dir(dir: &Path) -> bool {
    widen_permissions(dir);
    match std::fs::remove_dir_all(dir) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(path = %dir.display(), error = %err, "remove failed, forcing");
            force_remove(dir)
        }
    }
}

/// Delete all but the `max_dirs` newest subdirectories of `target`.
///
/// Age is the directory's creation time, or its modification time where creation time is not
/// available; ties are broken by name so that later run stamps count as newer. Plain files and
/// symlinks in `target` are ignored, and links inside a swept directory are never followed. A
/// missing `target` is a no-op. Deletion failures are reported in [`SweepReport::failed`] and
/// never abort the sweep.
#[tracing::instrument(skip_all, fields(target = %target.display(), max_dirs))]
pub fn sweep_retained(target: &Path, max_dirs: usize) -> SweepReport {
    let Ok(entries) = std::fs::read_dir(target) else {
        return SweepReport::default();
    };

    let mut dirs: Vec<(SystemTime, PathBuf)> = entries
        .flatten()
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| e.path())
        .filter_map(|p| match created_at(&p) {
            Some(t) => Some((t, p)),
            None => {
                tracing::warn!(path = %p.display(), "cannot read directory times, skipping");
                None
            }
        })
        .collect();
    dirs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    let mut report = SweepReport::default();
    for (idx, (_, dir)) in dirs.into_iter().enumerate() {
        if idx < max_dirs {
            report.kept.push(dir);
        } else if remove_run_dir(&dir) {
            report.removed.push(dir);
        } else {
            tracing::warn!(path = %dir.display(), "could not remove old run directory");
            report.failed.push(dir);
        }
    }

    if !report.removed.is_empty() || !report.failed.is_empty() {
        tracing::info!(
            kept = report.kept.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "retention sweep"
        );
    }
    report
}

#[cfg(test)]
#[path = "../tests/unit/retention.rs"]
mod tests;
