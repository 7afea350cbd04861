use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "newsreel", version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect news, render cards, build the combined video and its metadata.
    Run(RunArgs),
    /// Render a single card from a news item JSON file.
    Card(CardArgs),
    /// Keep only the newest run directories under a directory.
    Sweep(SweepArgs),
    /// Print the resolved manifest as JSON.
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct AssetsArg {
    /// Directory holding the card template, fonts, music and manifest.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    assets: AssetsArg,

    /// Manifest path (defaults to <assets>/RSS.txt).
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Output root; runs land in <out>/images/<stamp> and <out>/videos/<stamp>.
    #[arg(long, default_value = "output")]
    out: PathBuf,

    /// Scratch directory for run temporaries.
    #[arg(long, default_value = "temp")]
    temp: PathBuf,

    /// Explicit ffmpeg binary.
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Run directories to keep under images/ and videos/.
    #[arg(long, default_value_t = 2)]
    keep: usize,

    /// Per-invocation encoder timeout in seconds.
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Encoder attempts per invocation (timeouts only).
    #[arg(long, default_value_t = 2)]
    attempts: u32,
}

#[derive(Args, Debug)]
struct CardArgs {
    #[command(flatten)]
    assets: AssetsArg,

    /// News item JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// Directory whose subdirectories are swept.
    #[arg(long)]
    dir: PathBuf,

    /// Newest subdirectories to keep.
    #[arg(long, default_value_t = 2)]
    keep: usize,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(flatten)]
    assets: AssetsArg,

    /// Manifest path (defaults to <assets>/RSS.txt).
    #[arg(long)]
    manifest: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    newsreel::init_logging(&newsreel::LoggingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Card(args) => cmd_card(args),
        Command::Sweep(args) => cmd_sweep(args),
        Command::Config(args) => cmd_config(args),
    }
}

fn manifest_path(assets: &Path, explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| assets.join(newsreel::foundation::context::MANIFEST_FILE))
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    if args.keep == 0 {
        anyhow::bail!("--keep must be at least 1");
    }
    let assets = args.assets.assets;
    let config = newsreel::load_manifest(&manifest_path(&assets, args.manifest));

    let mut encoder = newsreel::EncoderSettings::discover(args.ffmpeg.as_deref())?;
    encoder.timeout = Duration::from_secs(args.timeout.max(1));
    encoder.attempts = args.attempts.max(1);

    let layout = newsreel::OutputLayout::new(&args.out, &assets, &args.temp);
    let mut ctx =
        newsreel::RunContext::new(newsreel::RunStamp::now(), layout, config, encoder.clone());
    ctx.max_retained_dirs = args.keep;

    let mut cards = newsreel::CardRenderer::discover(&assets, ctx.layout.template_path())?;
    let feed = newsreel::RssFeedSource::new();
    let process = encoder.process();

    let summary = newsreel::Pipeline::new(ctx, &feed, &mut cards, &process).run()?;

    eprintln!(
        "processed {} items: {} cards, {} clips",
        summary.items, summary.images, summary.clips
    );
    eprintln!("combined: {}", summary.combined.display());
    eprintln!("metadata: {}", summary.metadata.display());
    Ok(())
}

fn read_item_json(path: &Path) -> anyhow::Result<newsreel::NewsItem> {
    let f = File::open(path).with_context(|| format!("open news item '{}'", path.display()))?;
    let item: newsreel::NewsItem =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse news item JSON")?;
    Ok(item)
}

fn cmd_card(args: CardArgs) -> anyhow::Result<()> {
    let item = read_item_json(&args.in_path)?;
    let assets = args.assets.assets;
    let template = assets.join(newsreel::foundation::context::CARD_TEMPLATE_FILE);
    let mut cards = newsreel::CardRenderer::discover(&assets, template)?;
    cards.render_to_path(&item, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sweep(args: SweepArgs) -> anyhow::Result<()> {
    if args.keep == 0 {
        anyhow::bail!("--keep must be at least 1");
    }
    let report = newsreel::sweep_retained(&args.dir, args.keep);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize sweep report")?
    );
    if !report.failed.is_empty() {
        anyhow::bail!("{} directories could not be removed", report.failed.len());
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = newsreel::load_manifest(&manifest_path(&args.assets.assets, args.manifest));
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("serialize config")?
    );
    Ok(())
}
