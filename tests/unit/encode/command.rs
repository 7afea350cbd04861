use super::*;

fn zoom() -> ZoomClipSpec {
    ZoomClipSpec {
        image: PathBuf::from("/out/images/s/news_001_s.png"),
        output: PathBuf::from("/out/videos/s/news_001_s.mp4"),
        duration_secs: 3,
        fps: 25,
        width: 1080,
        height: 1920,
        zoom_max: 1.1,
        zoom_step: 0.0015,
    }
}

fn mix(total_secs: f64) -> AudioMixSpec {
    AudioMixSpec {
        video: PathBuf::from("/tmp/temp_combined_news_s.mp4"),
        music: PathBuf::from("/assets/bgm.mp3"),
        output: PathBuf::from("/out/videos/s/combined_news_s.mp4"),
        total_secs,
        seek_secs: 9.0,
        volume: 0.352,
        fade_secs: 1.0,
        bitrate: "192k".to_string(),
    }
}

#[test]
fn zoom_clip_args() {
    let cmd = zoom().build().unwrap();
    assert_eq!(cmd.kind, CommandKind::ZoomClip);
    assert_eq!(cmd.output, PathBuf::from("/out/videos/s/news_001_s.mp4"));
    assert_eq!(
        cmd.args_lossy(),
        vec![
            "-y",
            "-loglevel",
            "error",
            "-i",
            "/out/images/s/news_001_s.png",
            "-vf",
            "scale=iw*1.1:-1,zoompan=z='min(zoom+0.0015,1.1)':d=75:s=1080x1920:fps=25",
            "-t",
            "3",
            "-r",
            "25",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "/out/videos/s/news_001_s.mp4",
        ]
    );
}

#[test]
fn zoom_clip_validation() {
    let mut s = zoom();
    s.duration_secs = 0;
    assert!(s.build().is_err());

    let mut s = zoom();
    s.width = 1081;
    assert!(s.build().is_err());

    let mut s = zoom();
    s.zoom_max = 0.9;
    assert!(s.build().is_err());

    let mut s = zoom();
    s.zoom_max = f64::NAN;
    assert!(s.build().is_err());

    let mut s = zoom();
    s.fps = 0;
    assert!(matches!(s.build(), Err(ReelError::Validation(_))));
}

#[test]
fn concat_args() {
    let cmd = ConcatSpec {
        list_file: PathBuf::from("/tmp/video_list_s.txt"),
        output: PathBuf::from("/tmp/temp_combined_news_s.mp4"),
    }
    .build()
    .unwrap();
    assert_eq!(
        cmd.args_lossy(),
        vec![
            "-y",
            "-loglevel",
            "error",
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
            "/tmp/video_list_s.txt",
            "-c",
            "copy",
            "/tmp/temp_combined_news_s.mp4",
        ]
    );
}

#[test]
fn audio_mix_args() {
    let cmd = mix(9.0).build().unwrap();
    assert_eq!(cmd.kind, CommandKind::AudioMix);
    assert_eq!(
        cmd.args_lossy(),
        vec![
            "-y",
            "-loglevel",
            "error",
            "-i",
            "/tmp/temp_combined_news_s.mp4",
            "-stream_loop",
            "-1",
            "-ss",
            "9",
            "-i",
            "/assets/bgm.mp3",
            "-filter_complex",
            "[1:a]volume=0.352,afade=t=in:st=0:d=1,afade=t=out:st=8:d=1[a]",
            "-map",
            "0:v",
            "-map",
            "[a]",
            "-t",
            "9",
            "-shortest",
            "-c:v",
            "copy",
            "-c:a",
            "aac",
            "-b:a",
            "192k",
            "/out/videos/s/combined_news_s.mp4",
        ]
    );
}

#[test]
fn fade_out_start_is_clamped() {
    assert_eq!(mix(0.5).fade_out_start(), 0.0);
    assert!(mix(0.5).filter().contains("afade=t=out:st=0:d=1"));
    assert!(mix(0.0).build().is_err());
    assert!(mix(-1.0).build().is_err());
}

#[test]
fn concat_list_escapes_quotes() {
    let clips = vec![
        PathBuf::from("/v/a.mp4"),
        PathBuf::from("/v/it's.mp4"),
    ];
    let text = concat_list_contents(&clips).unwrap();
    assert_eq!(text, "file '/v/a.mp4'\nfile '/v/it'\\''s.mp4'\n");
}

#[test]
fn concat_list_paths_are_absolute() {
    let text = concat_list_contents(&[PathBuf::from("rel/clip.mp4")]).unwrap();
    let line = text.lines().next().unwrap();
    let path = line.trim_start_matches("file '").trim_end_matches('\'');
    assert!(Path::new(path).is_absolute() || path.contains(":/"));
    assert!(path.ends_with("rel/clip.mp4"));
}
