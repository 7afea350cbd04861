//! Shared fixtures for unit tests.

use std::{
    cell::RefCell,
    path::{Path, PathBuf},
};

use chrono::TimeZone as _;

use crate::{
    collect::NewsItem,
    config::PipelineConfig,
    encode::{
        command::{CommandKind, EncoderCommand},
        process::{Encoder, EncoderSettings},
    },
    foundation::{
        context::{OutputLayout, RunContext, RunStamp},
        error::{ReelError, ReelResult},
    },
    render::text::{FontPair, FontSet, FontSizes, TextLayoutEngine, system_font_candidates},
};

pub fn temp_dir(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "newsreel_{tag}_{}_{}",
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// First loadable pair of distinct bold/regular files: the Korean system candidates, then DejaVu. `None` when the
/// machine has neither, and font-dependent tests skip.
pub fn load_test_fonts(engine: &mut TextLayoutEngine) -> Option<FontSet> {
    let mut pairs = system_font_candidates();
    pairs.push(FontPair::new(
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    ));
    pairs
        .iter()
        .filter(|p| p.bold != p.regular && p.bold.is_file() && p.regular.is_file())
        .find_map(|p| FontSet::load(engine, p, FontSizes::default()).ok())
}

pub fn fixed_stamp() -> RunStamp {
    RunStamp::from_datetime(chrono::Local.with_ymd_and_hms(2026, 10, 18, 9, 5, 0).unwrap())
}

pub fn context_in(root: &Path) -> RunContext {
    let ctx = RunContext::new(
        fixed_stamp(),
        OutputLayout::new(root.join("out"), root.join("assets"), root.join("tmp")),
        PipelineConfig::default(),
        EncoderSettings::new("ffmpeg"),
    );
    ctx.prepare_dirs().unwrap();
    std::fs::create_dir_all(root.join("assets")).unwrap();
    ctx
}

pub fn news_item(id: u32, category: &str) -> NewsItem {
    NewsItem {
        id,
        category: category.to_string(),
        title: format!("기사 제목 {id}"),
        summary: format!("기사 요약 {id}"),
        source_line: format!("[연합뉴스] https://news.example/{id}"),
        link: format!("https://news.example/{id}"),
        author: "연합뉴스".to_string(),
        published_at: None,
    }
}

/// Records every command and writes a stand-in output file unless told to fail that kind.
#[derive(Default)]
pub struct RecordingEncoder {
    pub calls: RefCell<Vec<EncoderCommand>>,
    pub fail: Vec<CommandKind>,
}

impl RecordingEncoder {
    pub fn failing(kinds: &[CommandKind]) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail: kinds.to_vec(),
        }
    }

    pub fn kinds(&self) -> Vec<CommandKind> {
        self.calls.borrow().iter().map(|c| c.kind).collect()
    }
}

impl Encoder for RecordingEncoder {
    fn run(&self, cmd: &EncoderCommand) -> ReelResult<()> {
        self.calls.borrow_mut().push(cmd.clone());
        if self.fail.contains(&cmd.kind) {
            return Err(ReelError::encode(format!("{} failed (test)", cmd.kind)));
        }
        if let Some(parent) = cmd.output.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&cmd.output, b"fake media").unwrap();
        Ok(())
    }
}
