use super::*;
use crate::{
    encode::command::CommandKind,
    test_support::{RecordingEncoder, context_in, temp_dir},
};

fn make_clips(ctx: &RunContext, n: usize) -> Vec<PathBuf> {
    (1..=n)
        .map(|i| {
            let p = ctx.videos_dir().join(format!("news_{i:03}_x.mp4"));
            std::fs::write(&p, b"clip").unwrap();
            p
        })
        .collect()
}

#[test]
fn missing_clip_means_no_encoder_calls() {
    let root = temp_dir("combine_missing");
    let ctx = context_in(&root);
    let mut clips = make_clips(&ctx, 2);
    clips.push(ctx.videos_dir().join("gone.mp4"));
    let enc = RecordingEncoder::default();

    assert!(combine_clips(&clips, &ctx, &enc).is_err());
    assert!(enc.calls.borrow().is_empty());
    assert!(combine_clips(&[], &ctx, &enc).is_err());
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn without_music_moves_concat_output_into_place() {
    let root = temp_dir("combine_silent");
    let ctx = context_in(&root);
    let clips = make_clips(&ctx, 3);
    let enc = RecordingEncoder::default();

    let (video, handoff) = combine_clips(&clips, &ctx, &enc).unwrap();
    assert_eq!(enc.kinds(), vec![CommandKind::Concat]);
    assert_eq!(
        video.path,
        ctx.videos_dir().join("combined_news_20261018_0905.mp4")
    );
    assert!(video.path.is_file());
    assert!(!video.audio_mixed);
    assert_eq!(video.clip_count, 3);
    assert_eq!(video.total_secs, 9.0);

    // Temporaries are gone; clips survive until release.
    assert!(!ctx.temp_dir().join("video_list_20261018_0905.txt").exists());
    assert!(!ctx.temp_dir().join("temp_combined_news_20261018_0905.mp4").exists());
    assert!(clips.iter().all(|c| c.is_file()));
    assert_eq!(handoff.clips().len(), 3);
    assert_eq!(handoff.release(), 3);
    assert!(clips.iter().all(|c| !c.exists()));
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn with_music_mixes_over_concat() {
    let root = temp_dir("combine_music");
    let ctx = context_in(&root);
    std::fs::write(ctx.layout.music_path(), b"mp3").unwrap();
    let clips = make_clips(&ctx, 2);
    let enc = RecordingEncoder::default();

    let (video, handoff) = combine_clips(&clips, &ctx, &enc).unwrap();
    assert_eq!(enc.kinds(), vec![CommandKind::Concat, CommandKind::AudioMix]);
    assert!(video.audio_mixed);
    let mix_args = enc.calls.borrow()[1].args_lossy();
    assert!(mix_args.iter().any(|a| a.contains("afade=t=out:st=5:d=1")));
    assert!(!ctx.temp_dir().join("temp_combined_news_20261018_0905.mp4").exists());
    drop(handoff);
    assert!(clips.iter().all(|c| c.is_file()), "dropping the handoff keeps clips");
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn failed_mix_falls_back_to_silent_video() {
    let root = temp_dir("combine_fallback");
    let ctx = context_in(&root);
    std::fs::write(ctx.layout.music_path(), b"mp3").unwrap();
    let clips = make_clips(&ctx, 1);
    let enc = RecordingEncoder::failing(&[CommandKind::AudioMix]);

    let (video, handoff) = combine_clips(&clips, &ctx, &enc).unwrap();
    assert!(!video.audio_mixed);
    assert_eq!(std::fs::read(&video.path).unwrap(), b"fake media");
    handoff.release();
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn concat_failure_cleans_up_list_file() {
    let root = temp_dir("combine_concat_fail");
    let ctx = context_in(&root);
    let clips = make_clips(&ctx, 2);
    let enc = RecordingEncoder::failing(&[CommandKind::Concat]);

    assert!(combine_clips(&clips, &ctx, &enc).is_err());
    assert!(!ctx.temp_dir().join("video_list_20261018_0905.txt").exists());
    std::fs::remove_dir_all(&root).ok();
}
