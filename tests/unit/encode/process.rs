use std::ffi::OsString;

use super::*;
use crate::{encode::command::CommandKind, test_support::temp_dir};

fn shell(script: &str, output: &Path, extra: &[&Path]) -> EncoderCommand {
    let mut args: Vec<OsString> = vec!["-c".into(), script.into(), "sh".into()];
    args.extend(extra.iter().map(|p| p.as_os_str().to_owned()));
    EncoderCommand {
        kind: CommandKind::ZoomClip,
        args,
        output: output.to_path_buf(),
    }
}

fn sh() -> FfmpegProcess {
    FfmpegProcess::new("sh")
}

#[cfg(unix)]
#[test]
fn success_requires_output_file() {
    let dir = temp_dir("proc_ok");
    let out = dir.join("nested").join("clip.mp4");
    sh().run(&shell(r#"touch "$1""#, &out, &[&out])).unwrap();
    assert!(out.is_file());

    let missing = dir.join("never.mp4");
    let err = sh().run(&shell("true", &missing, &[])).unwrap_err();
    assert!(err.to_string().contains("produced no output"));
    std::fs::remove_dir_all(&dir).ok();
}

#[cfg(unix)]
#[test]
fn nonzero_exit_is_not_retried_and_reports_stderr() {
    let dir = temp_dir("proc_fail");
    let counter = dir.join("count.txt");
    let out = dir.join("clip.mp4");
    let err = sh()
        .run(&shell(
            r#"echo run >> "$1"; echo boom-from-encoder >&2; exit 3"#,
            &out,
            &[&counter],
        ))
        .unwrap_err();
    assert!(matches!(err, ReelError::Encode(_)));
    assert!(err.to_string().contains("boom-from-encoder"));
    let runs = std::fs::read_to_string(&counter).unwrap();
    assert_eq!(runs.lines().count(), 1);
    std::fs::remove_dir_all(&dir).ok();
}

#[cfg(unix)]
#[test]
fn timeout_kills_and_retries_up_to_attempts() {
    let dir = temp_dir("proc_timeout");
    let counter = dir.join("count.txt");
    let out = dir.join("clip.mp4");
    let proc = sh()
        .with_timeout(Duration::from_millis(200))
        .with_attempts(2);
    let started = Instant::now();
    let err = proc
        .run(&shell(
            r#"echo run >> "$1"; touch "$2"; exec sleep 30"#,
            &out,
            &[&counter, &out],
        ))
        .unwrap_err();
    assert!(err.to_string().contains("timed out after 2 attempt(s)"));
    assert!(started.elapsed() < Duration::from_secs(20));
    assert_eq!(std::fs::read_to_string(&counter).unwrap().lines().count(), 2);
    assert!(!out.exists(), "partial output should be removed");
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn spawn_failure_is_encode_error() {
    let err = FfmpegProcess::new("/definitely/not/a/binary")
        .run(&EncoderCommand {
            kind: CommandKind::Concat,
            args: Vec::new(),
            output: std::env::temp_dir().join("newsreel_never.mp4"),
        })
        .unwrap_err();
    assert!(err.to_string().starts_with("encode error: failed to spawn"));
}

#[test]
fn explicit_missing_ffmpeg_is_config_error() {
    let err = EncoderSettings::discover(Some(Path::new("/no/ffmpeg/here"))).unwrap_err();
    assert!(matches!(err, ReelError::Config(_)));
}

#[test]
fn settings_defaults() {
    let s = EncoderSettings::new("ffmpeg");
    assert_eq!(s.timeout, Duration::from_secs(300));
    assert_eq!(s.attempts, 2);
    let p = s.process();
    assert_eq!(p.program, PathBuf::from("ffmpeg"));
    assert!(!well_known_ffmpeg_paths().is_empty());
}

#[test]
fn stderr_tail_is_bounded() {
    let long = "x".repeat(STDERR_TAIL_CHARS + 50);
    let tail = stderr_tail(long.as_bytes());
    assert!(tail.starts_with("..."));
    assert_eq!(tail.chars().count(), STDERR_TAIL_CHARS + 3);
}
