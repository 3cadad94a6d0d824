//! noisebox-bench: Benchmark harness for the sample-generation engine
//!
//! Runs generators without cpal so native profilers (samply, Instruments,
//! perf) see only engine code.
//!
//! Usage:
//!   noisebox-bench run --samples 1000000
//!   noisebox-bench run shepard-up granular --samples 500000
//!   noisebox-bench smoke
//!   samply record ./target/profiling/noisebox-bench run karplus

use clap::{Parser, Subcommand};
use colored::Colorize;
use noisebox_core::analysis::SampleStats;
use noisebox_core::consts::MIDPOINT;
use noisebox_core::{Engine, EngineConfig, Selector};
use std::hint::black_box;
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use std::time::Instant;

const DEFAULT_SAMPLES: u64 = 11_025 * 30; // 30 seconds at the default rate

/// Benchmark harness for the noisebox engine
#[derive(Parser)]
#[command(name = "noisebox-bench")]
#[command(about = "Profile and benchmark the noisebox generators")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Time each generator against the real-time budget
    Run {
        /// Generators to run (default: all)
        selectors: Vec<Selector>,

        /// Samples per generator
        #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLES)]
        samples: u64,

        /// Warmup samples before measurement
        #[arg(short, long, default_value_t = 11_025)]
        warmup: u64,

        /// Engine sample rate in Hz
        #[arg(short, long, default_value_t = 11_025)]
        sample_rate: u32,
    },

    /// Run every generator briefly and check its output
    Smoke {
        /// Samples per generator
        #[arg(short = 'n', long, default_value_t = 44_100)]
        samples: u64,
    },
}

fn main() -> ExitCode {
    #[cfg(feature = "profile")]
    {
        use tracing_subscriber::prelude::*;
        let tracy_layer = tracing_tracy::TracyLayer::default();
        tracing_subscriber::registry().with(tracy_layer).init();
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            selectors,
            samples,
            warmup,
            sample_rate,
        } => run_benchmark(&selectors, samples, warmup, sample_rate),
        Commands::Smoke { samples } => smoke_test(samples),
    }
}

struct Timing {
    ns_per_sample: f64,
    budget_usage: f64,
}

fn time_selector(engine: &mut Engine, selector: Selector, samples: u64, warmup: u64) -> Timing {
    for _ in 0..warmup {
        black_box(engine.produce(selector, 1.0));
    }

    let start = Instant::now();
    for _ in 0..samples {
        black_box(engine.produce(black_box(selector), 1.0));
    }
    let elapsed = start.elapsed();

    let ns_per_sample = elapsed.as_nanos() as f64 / samples.max(1) as f64;
    let budget_ns = 1_000_000_000.0 / engine.sample_rate() as f64;
    Timing {
        ns_per_sample,
        budget_usage: ns_per_sample / budget_ns * 100.0,
    }
}

fn run_benchmark(selectors: &[Selector], samples: u64, warmup: u64, sample_rate: u32) -> ExitCode {
    let config = EngineConfig {
        sample_rate,
        ..EngineConfig::default()
    };
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    let selectors = if selectors.is_empty() {
        Selector::ALL
    } else {
        selectors
    };

    let mut engine = Engine::new(&config);
    let budget_ns = 1_000_000_000.0 / sample_rate as f64;
    println!(
        "Running {} generators: {} samples each ({:.2}s at {}Hz), warmup {}",
        selectors.len(),
        samples,
        samples as f64 / sample_rate as f64,
        sample_rate,
        warmup
    );
    println!("Real-time budget: {:.1} ns/sample\n", budget_ns);
    println!("  {:20} {:>10} {:>9}", "Generator", "ns/sample", "Budget");
    println!("  {:-<20} {:-<10} {:-<9}", "", "", "");

    let mut worst: Option<(Selector, f64)> = None;
    for &selector in selectors {
        let timing = time_selector(&mut engine, selector, samples, warmup);
        let usage = format!("{:.3}%", timing.budget_usage);
        println!(
            "  {:20} {:>10.2} {:>9}",
            selector.id(),
            timing.ns_per_sample,
            if timing.budget_usage > 100.0 {
                usage.red()
            } else {
                usage.green()
            }
        );
        if worst.is_none_or(|(_, w)| timing.budget_usage > w) {
            worst = Some((selector, timing.budget_usage));
        }
    }

    if let Some((selector, usage)) = worst {
        println!();
        if usage > 100.0 {
            println!("  WARNING: {} exceeds the real-time budget!", selector.id());
            return ExitCode::FAILURE;
        }
        println!(
            "  Worst case {} at {:.3}% ({:.0}x headroom)",
            selector.id(),
            usage,
            100.0 / usage.max(f64::EPSILON)
        );
    }
    ExitCode::SUCCESS
}

fn smoke_test(samples: u64) -> ExitCode {
    println!("Running smoke test with {} samples per generator\n", samples);

    let mut engine = Engine::new(&EngineConfig::default());
    let mut failures = 0;
    for &selector in Selector::ALL {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            (0..samples)
                .map(|_| engine.produce(selector, 1.0))
                .collect::<Vec<u8>>()
        }));
        let output = match result {
            Ok(output) => output,
            Err(_) => {
                println!("  {} {}", "FAIL".red(), selector.id());
                failures += 1;
                continue;
            }
        };
        let Some(stats) = SampleStats::from_samples(&output) else {
            println!("  {} {} (no samples)", "SKIP".yellow(), selector.id());
            continue;
        };
        if stats.min == MIDPOINT && stats.max == MIDPOINT {
            println!("  {} {} is silent", "WARN".yellow(), selector.id());
        } else {
            println!(
                "  {} {:20} range {:>3}..={:<3} mad {:.1}",
                "ok".green(),
                selector.id(),
                stats.min,
                stats.max,
                stats.mean_abs_deviation
            );
        }
    }

    println!();
    if failures > 0 {
        println!("{} generators panicked", failures);
        ExitCode::FAILURE
    } else {
        println!("All {} generators ran", Selector::COUNT);
        ExitCode::SUCCESS
    }
}
