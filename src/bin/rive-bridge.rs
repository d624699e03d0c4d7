use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rive_bridge::runtime::document::DocumentImporter;
use rive_bridge::{
    AnimationFile, Artboard, ArtboardParams, ArtboardSelector, BridgeConfig, HeadlessFactory,
    HeadlessProvisioner, ImportResult, InlineSubmission, RecordingDevice, RenderThread, Renderer,
    RendererServices, SubmissionContext,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rive-bridge", version)]
struct Cli {
    /// Bridge configuration JSON; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print file stats, assets and the catalog of every artboard.
    Inspect(InspectArgs),
    /// Tick one artboard headlessly and print the events it reported.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input animation document.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input animation document.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Artboard name, or index when numeric. Defaults to the first artboard.
    #[arg(long)]
    artboard: Option<String>,

    /// State machine to bind; the default one when omitted.
    #[arg(long, default_value = "")]
    state_machine: String,

    /// Number of frames to tick.
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Seconds per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Set a number input before the first frame (`name=value`).
    #[arg(long = "set-number", value_parser = parse_key_value::<f32>)]
    set_number: Vec<(String, f32)>,

    /// Set a boolean input before the first frame (`name=value`).
    #[arg(long = "set-bool", value_parser = parse_key_value::<bool>)]
    set_bool: Vec<(String, bool)>,

    /// Fire a trigger before the first frame.
    #[arg(long)]
    fire: Vec<String>,

    /// Submit on a dedicated render thread instead of inline.
    #[arg(long)]
    render_thread: bool,
}

fn parse_key_value<T>(s: &str) -> Result<(String, T), String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let value = value
        .parse()
        .map_err(|e| format!("invalid value for '{key}': {e}"))?;
    Ok((key.to_string(), value))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => BridgeConfig::from_path(path)?,
        None => BridgeConfig::default(),
    };
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(config, args),
        Command::Play(args) => cmd_play(config, args),
    }
}

fn headless_renderer(
    config: BridgeConfig,
    render_thread: bool,
) -> anyhow::Result<(Arc<Renderer>, RecordingDevice)> {
    let device = RecordingDevice::new();
    let submission: Arc<dyn SubmissionContext> = if render_thread {
        Arc::new(RenderThread::spawn("rive-bridge-render")?)
    } else {
        Arc::new(InlineSubmission)
    };
    let services = RendererServices::new(
        Box::new(device.clone()),
        Arc::new(HeadlessProvisioner::new()),
        submission,
    );
    Ok((Renderer::new(config, services)?, device))
}

fn load_file(renderer: &Arc<Renderer>, path: &Path) -> anyhow::Result<AnimationFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read animation '{}'", path.display()))?;
    let mut file = AnimationFile::new(renderer.clone());
    match file.import(&bytes, &DocumentImporter, &HeadlessFactory::default()) {
        ImportResult::Success => Ok(file),
        other => anyhow::bail!("import of '{}' failed: {other:?}", path.display()),
    }
}

fn cmd_inspect(config: BridgeConfig, args: InspectArgs) -> anyhow::Result<()> {
    let (renderer, _device) = headless_renderer(config, false)?;
    let file = load_file(&renderer, &args.in_path)?;

    let mut artboards = Vec::new();
    for index in 0..file.artboard_count() {
        let mut artboard = Artboard::new(renderer.clone());
        artboard.initialize(
            &file,
            ArtboardParams {
                selector: ArtboardSelector::Index(index),
                ..ArtboardParams::default()
            },
        );
        renderer.flush();
        artboards.push(serde_json::json!({
            "catalog": artboard.catalog(),
            "bounds": artboard.bounds(),
        }));
    }

    let summary = serde_json::json!({
        "stats": file.stats(),
        "assets": file.assets().values().collect::<Vec<_>>(),
        "artboards": artboards,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_play(config: BridgeConfig, args: PlayArgs) -> anyhow::Result<()> {
    let (renderer, device) = headless_renderer(config, args.render_thread)?;
    let file = load_file(&renderer, &args.in_path)?;

    let selector = match args.artboard.as_deref() {
        None => ArtboardSelector::default(),
        Some(s) => match s.parse::<usize>() {
            Ok(index) => ArtboardSelector::Index(index),
            Err(_) => ArtboardSelector::from(s),
        },
    };
    let mut artboard = Artboard::new(renderer.clone());
    let issued = artboard.initialize(
        &file,
        ArtboardParams {
            selector,
            state_machine_name: args.state_machine,
            ..ArtboardParams::default()
        },
    );
    renderer.flush();
    if !issued {
        anyhow::bail!("artboard could not be initialized");
    }
    artboard.require_initialized()?;

    let target = renderer.create_default_target("cli")?;
    artboard.bind_render_target(target.clone());

    artboard.begin_input();
    for (name, value) in &args.set_number {
        artboard.set_number(name, *value);
    }
    for (name, value) in &args.set_bool {
        artboard.set_bool(name, *value);
    }
    for name in &args.fire {
        artboard.fire_trigger(name);
    }
    artboard.end_input();

    let mut events = Vec::new();
    for frame in 0..args.frames {
        artboard.tick(args.dt);
        renderer.submit_target(&target);
        for event in artboard.tick_reported_events() {
            events.push(serde_json::json!({ "frame": frame, "event": event }));
        }
    }
    renderer.flush();

    let summary = serde_json::json!({
        "artboard": artboard.name(),
        "state_machine": artboard.state_machine_name(),
        "frames": args.frames,
        "events": events,
        "device_calls": device.calls().len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
