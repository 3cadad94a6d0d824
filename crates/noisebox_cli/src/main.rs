//! noisebox: play, render and inspect the 8-bit noise engine
//!
//! - `list`: every selector with its track position, name and gain
//! - `play`: open the default output device with an interactive control loop
//! - `render`: write one selector to an 8-bit WAV file
//! - `analyze`: level statistics and high-band energy per selector
//!
//! Configuration is read from `--config`, `$NOISEBOX_CONFIG`, or
//! `<config dir>/noisebox/config.json`, in that order. Flags win over the file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use crossbeam_channel::{Sender, select};
use noisebox::cursor::SHUFFLE_INTERVAL;
use noisebox::{Player, TrackCursor, render_samples, render_to_wav};
use noisebox_core::analysis::{SampleStats, band_energy_ratio};
use noisebox_core::consts::{MIDPOINT, TRACK_COUNT};
use noisebox_core::{Controls, Engine, EngineConfig, GainTable, Selector, track_for_selector};
use serde::Serialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const TICK: Duration = Duration::from_millis(250);
const BUDGET_REPORT_INTERVAL: Duration = Duration::from_secs(2);
const SCOPE_WIDTH: usize = 64;

/// Play and inspect the noisebox 8-bit synthesizer
#[derive(Parser)]
#[command(name = "noisebox")]
#[command(about = "Play, render and analyze the noisebox 8-bit synthesizer")]
#[command(version)]
struct Cli {
    /// Engine config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List every generator with its track, name and normalization gain
    List,

    /// Play through the default output device
    Play {
        /// Generator to start on (e.g. "pink", "shepard-up")
        #[arg(short, long, conflicts_with = "track")]
        selector: Option<Selector>,

        /// Track to start on, 1-based
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=TRACK_COUNT as i64))]
        track: Option<u16>,

        /// Master gain in [0, 1]
        #[arg(short, long)]
        gain: Option<f32>,

        /// Stop after this many seconds
        #[arg(long, value_parser = parse_seconds)]
        seconds: Option<Duration>,

        /// Start in shuffle mode, changing track every SECS seconds
        #[arg(
            long,
            value_name = "SECS",
            num_args = 0..=1,
            default_missing_value = "12",
            value_parser = parse_seconds
        )]
        shuffle: Option<Duration>,

        /// Record the engine output to an 8-bit WAV
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Render one generator to an 8-bit mono WAV
    Render {
        /// Generator id
        selector: Selector,

        /// Output WAV path
        out: PathBuf,

        /// Length in seconds
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f32,

        /// Master gain in [0, 1]
        #[arg(short, long)]
        gain: Option<f32>,
    },

    /// Print level statistics and high-band energy per generator
    Analyze {
        /// Generators to analyze (default: all)
        selectors: Vec<Selector>,

        /// Samples rendered per generator
        #[arg(short = 'n', long, default_value_t = 1 << 16)]
        samples: usize,
    },
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List => cmd_list(&config, cli.format),
        Commands::Play {
            selector,
            track,
            gain,
            seconds,
            shuffle,
            record,
        } => cmd_play(
            config,
            PlayOptions {
                selector,
                track: track.map(|t| t as usize - 1),
                gain,
                seconds,
                shuffle,
                record,
            },
        ),
        Commands::Render {
            selector,
            out,
            seconds,
            gain,
        } => cmd_render(config, selector, &out, seconds, gain),
        Commands::Analyze { selectors, samples } => {
            cmd_analyze(config, &selectors, samples, cli.format)
        }
    }
}

/// Parse a non-negative, finite number of seconds.
fn parse_seconds(arg: &str) -> Result<Duration, String> {
    let secs: f64 = arg
        .trim()
        .parse()
        .map_err(|e| format!("`{arg}` is not a number: {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("`{arg}` is not a valid duration: {e}"))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    #[cfg(feature = "profile")]
    let registry = registry.with(tracing_tracy::TracyLayer::default());

    registry.init();
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(override_path) = std::env::var("NOISEBOX_CONFIG") {
        return Some(PathBuf::from(override_path));
    }
    dirs::config_dir().map(|d| d.join("noisebox").join("config.json"))
}

fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(EngineConfig::default()),
        },
    };
    let config = EngineConfig::from_json_file(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

// ============================================================================
// list
// ============================================================================

#[derive(Debug, Serialize)]
struct SelectorRow {
    index: u8,
    id: &'static str,
    name: &'static str,
    gain: f32,
    /// 1-based; absent for generators not on the track table
    track: Option<usize>,
}

/// Gains are the effective ones: built-in table plus config overrides.
fn selector_rows(gains: &GainTable) -> Vec<SelectorRow> {
    Selector::ALL
        .iter()
        .map(|&s| SelectorRow {
            index: s.index(),
            id: s.id(),
            name: s.name(),
            gain: gains.gain(s),
            track: track_for_selector(s).map(|t| t + 1),
        })
        .collect()
}

fn cmd_list(config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let rows = selector_rows(&config.gain_table());
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => {
            println!(
                "{:>5} {:>5} {:20} {:22} {:>5}",
                "INDEX", "TRACK", "ID", "NAME", "GAIN"
            );
            println!("{}", "-".repeat(62));
            for row in rows {
                let track = row
                    .track
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:>5} {:>5} {:20} {:22} {:>5}",
                    row.index.to_string().dimmed(),
                    track,
                    row.id.cyan(),
                    row.name,
                    format!("{:.2}", row.gain).yellow()
                );
            }
        }
    }
    Ok(())
}

// ============================================================================
// play
// ============================================================================

struct PlayOptions {
    selector: Option<Selector>,
    track: Option<usize>,
    gain: Option<f32>,
    seconds: Option<Duration>,
    shuffle: Option<Duration>,
    record: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlCommand {
    Next,
    Prev,
    VolumeUp,
    VolumeDown,
    TogglePlay,
    ToggleShuffle,
    Status,
    Quit,
}

/// One line of stdin. A line of only spaces toggles playback.
fn parse_command(line: &str) -> Option<ControlCommand> {
    if !line.is_empty() && line.trim().is_empty() {
        return Some(ControlCommand::TogglePlay);
    }
    match line.trim().to_ascii_lowercase().as_str() {
        "n" | "next" => Some(ControlCommand::Next),
        "p" | "prev" => Some(ControlCommand::Prev),
        "+" | "=" => Some(ControlCommand::VolumeUp),
        "-" | "_" => Some(ControlCommand::VolumeDown),
        "t" | "space" => Some(ControlCommand::TogglePlay),
        "s" | "shuffle" => Some(ControlCommand::ToggleShuffle),
        "?" | "i" => Some(ControlCommand::Status),
        "q" | "quit" => Some(ControlCommand::Quit),
        _ => None,
    }
}

fn spawn_stdin_reader(tx: Sender<ControlCommand>) {
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(cmd) => {
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("keys: n p + - t s ? q (space toggles play)"),
            }
        }
    });
}

/// Peak deviation from the midpoint per column, drawn with block glyphs.
fn scope_line(samples: &[u8], width: usize) -> String {
    const GLYPHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    if samples.is_empty() || width == 0 {
        return String::new();
    }
    let bucket = samples.len().div_ceil(width);
    samples
        .chunks(bucket)
        .map(|chunk| {
            let peak = chunk
                .iter()
                .map(|&s| (s as i32 - MIDPOINT as i32).unsigned_abs())
                .max()
                .unwrap_or(0);
            GLYPHS[((peak as usize * (GLYPHS.len() - 1)) / 128).min(GLYPHS.len() - 1)]
        })
        .collect()
}

fn print_status(cursor: &TrackCursor, player: &Player, shuffle_on: bool) {
    let controls = player.controls();
    let selector = controls.selector();
    let name = selector.map(|s| s.name()).unwrap_or("Silence");
    println!(
        "Track {:>2}/{}  {:22} vol {:>3.0}%  {}  shuffle {}{}",
        cursor.track() + 1,
        TRACK_COUNT,
        name.cyan(),
        controls.master_gain() * 100.0,
        if player.is_playing() {
            "playing".green()
        } else {
            "paused ".yellow()
        },
        if shuffle_on { "on" } else { "off" },
        if player.is_recording() { "  ● rec".red().to_string() } else { String::new() },
    );
    println!("  [{}]", scope_line(&player.scope_snapshot(), SCOPE_WIDTH));
}

fn cmd_play(mut config: EngineConfig, opts: PlayOptions) -> Result<()> {
    if let Some(g) = opts.gain {
        config.master_gain = g;
    }
    if let Some(s) = opts.selector {
        config.selector = s;
    }
    config.validate()?;

    let engine = Engine::new(&config);
    let controls = Arc::new(Controls::new(config.selector, config.master_gain));

    let start_track = opts
        .track
        .or_else(|| track_for_selector(config.selector))
        .unwrap_or(0);
    let mut cursor = TrackCursor::new(controls.clone(), start_track);
    if opts.track.is_none() && track_for_selector(config.selector).is_none() {
        // Off-table generators are still playable by selector.
        controls.set_selector(config.selector);
    }

    let player = Player::start(engine, controls.clone())?;
    let info = player.info();
    tracing::info!(
        device = %info.device_name,
        rate = info.device_rate,
        channels = info.channels,
        "playing"
    );

    if let Some(path) = opts.record {
        player.start_recording(Some(path))?;
    }

    let (tx, rx) = crossbeam_channel::unbounded();
    spawn_stdin_reader(tx.clone());
    let ctrlc_tx = tx;
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(ControlCommand::Quit);
    })
    .context("failed to install ctrl-c handler")?;

    let mut shuffle_interval = opts.shuffle.unwrap_or(SHUFFLE_INTERVAL);
    if shuffle_interval.is_zero() {
        shuffle_interval = SHUFFLE_INTERVAL;
    }
    let mut shuffle_on = opts.shuffle.is_some();
    let mut last_shuffle = Instant::now();
    let mut last_report = Instant::now();
    let deadline = opts.seconds.and_then(|s| Instant::now().checked_add(s));
    let mut rng = rand::rng();
    let ticker = crossbeam_channel::tick(TICK);

    print_status(&cursor, &player, shuffle_on);

    loop {
        select! {
            recv(rx) -> msg => {
                let Ok(cmd) = msg else { continue };
                match cmd {
                    ControlCommand::Next => {
                        cursor.next();
                    }
                    ControlCommand::Prev => {
                        cursor.prev();
                    }
                    ControlCommand::VolumeUp => {
                        cursor.volume_up();
                    }
                    ControlCommand::VolumeDown => {
                        cursor.volume_down();
                    }
                    ControlCommand::TogglePlay => {
                        player.toggle_playing();
                    }
                    ControlCommand::ToggleShuffle => {
                        shuffle_on = !shuffle_on;
                        last_shuffle = Instant::now();
                        tracing::info!(shuffle = shuffle_on, "shuffle");
                    }
                    ControlCommand::Status => {}
                    ControlCommand::Quit => break,
                }
                print_status(&cursor, &player, shuffle_on);
            }
            recv(ticker) -> _ => {
                let now = Instant::now();
                if deadline.is_some_and(|d| now >= d) {
                    break;
                }
                if shuffle_on && player.is_playing() && now - last_shuffle >= shuffle_interval {
                    cursor.shuffle(&mut rng);
                    last_shuffle = now;
                    print_status(&cursor, &player, shuffle_on);
                }
                for err in player.drain_errors() {
                    tracing::error!(%err, "device error");
                }
                if now - last_report >= BUDGET_REPORT_INTERVAL {
                    last_report = now;
                    let budget = player.take_budget_snapshot();
                    if budget.is_overrun() {
                        tracing::warn!(
                            peak_usage = budget.peak_usage,
                            avg_usage = budget.avg_usage,
                            "audio callback overran its budget"
                        );
                    } else {
                        tracing::debug!(avg_usage = budget.avg_usage, "audio budget");
                    }
                }
            }
        }
    }

    if let Some(path) = player.stop_recording()? {
        println!("Recorded {}", path.display());
    }
    player.stop()
}

// ============================================================================
// render / analyze
// ============================================================================

fn cmd_render(
    config: EngineConfig,
    selector: Selector,
    out: &Path,
    seconds: f32,
    gain: Option<f32>,
) -> Result<()> {
    let mut engine = Engine::new(&config);
    let gain = gain.unwrap_or(config.master_gain);
    let written = render_to_wav(&mut engine, selector, gain, seconds, out)?;
    println!(
        "Wrote {} samples of {} to {}",
        written,
        selector.name().cyan(),
        out.display()
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct AnalysisRow {
    id: &'static str,
    name: &'static str,
    mean: f32,
    std_dev: f32,
    min: u8,
    max: u8,
    mean_abs_deviation: f32,
    /// Energy above a quarter of the sample rate
    high_band_ratio: f32,
}

fn analyze_selector(
    engine: &mut Engine,
    selector: Selector,
    samples: usize,
    gain: f32,
) -> Option<AnalysisRow> {
    let rendered = render_samples(engine, selector, gain, samples);
    let stats = SampleStats::from_samples(&rendered)?;
    let split = engine.sample_rate() as f32 / 4.0;
    Some(AnalysisRow {
        id: selector.id(),
        name: selector.name(),
        mean: stats.mean,
        std_dev: stats.std_dev,
        min: stats.min,
        max: stats.max,
        mean_abs_deviation: stats.mean_abs_deviation,
        high_band_ratio: band_energy_ratio(&rendered, split, engine.sample_rate()),
    })
}

fn cmd_analyze(
    config: EngineConfig,
    selectors: &[Selector],
    samples: usize,
    format: OutputFormat,
) -> Result<()> {
    let selectors = if selectors.is_empty() {
        Selector::ALL
    } else {
        selectors
    };
    let mut engine = Engine::new(&config);
    let rows: Vec<AnalysisRow> = selectors
        .iter()
        .filter_map(|&s| analyze_selector(&mut engine, s, samples, config.master_gain))
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => {
            println!(
                "{:20} {:>7} {:>7} {:>4} {:>4} {:>7} {:>6}",
                "ID", "MEAN", "STD", "MIN", "MAX", "MAD", "HIGH"
            );
            println!("{}", "-".repeat(62));
            for row in rows {
                let high = format!("{:.3}", row.high_band_ratio);
                println!(
                    "{:20} {:>7.2} {:>7.2} {:>4} {:>4} {:>7.2} {:>6}",
                    row.id.cyan(),
                    row.mean,
                    row.std_dev,
                    row.min,
                    row.max,
                    row.mean_abs_deviation,
                    if row.high_band_ratio > 0.35 { high.red() } else { high.normal() }
                );
            }
        }
    }
    Ok(())
}
