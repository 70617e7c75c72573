//! `fleet-headless`: drive the fleet engine from the command line.
//!
//! Spawns robots spread over the graph, sends each one to the vertex
//! mirrored through the vertex list, and prints a status table until every
//! robot is idle (or charging).  Events go to a timestamped log file;
//! snapshots optionally go to CSV.
//!
//! ```text
//! fleet-headless --robots 4 --csv-dir ./output
//! RUST_LOG=fm_traffic=debug fleet-headless --graph my_site.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use fm_core::{FleetConfig, VertexId};
use fm_fleet::{FleetManager, FleetManagerBuilder, TracingSink};
use fm_graph::NavGraph;
use fm_output::{CsvSnapshotWriter, LogFileSink};

const BUNDLED_GRAPH: &str = include_str!("../nav_graph.json");

#[derive(Parser)]
#[command(name = "fleet-headless")]
#[command(version, about = "Run the fleet coordination engine without a GUI", long_about = None)]
struct Cli {
    /// Navigation graph JSON (default: bundled warehouse graph)
    #[arg(short, long)]
    graph: Option<PathBuf>,

    /// Number of robots to spawn
    #[arg(short, long, default_value_t = 4)]
    robots: usize,

    /// Travel speed in graph units per second
    #[arg(long, default_value_t = 200.0)]
    speed: f64,

    /// Upper bound of the random extra delay between lane retries, in ms
    #[arg(long, default_value_t = 100)]
    jitter_ms: u64,

    /// Seed for the retry jitter
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Event log file
    #[arg(long, default_value = "logs/fleet_logs.txt")]
    log: PathBuf,

    /// Write robot_snapshots.csv into this directory
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Status print interval in milliseconds
    #[arg(long, default_value_t = 250)]
    interval_ms: u64,

    /// Stop every robot after this many seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Debug-level logging when RUST_LOG is not set
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_graph(path: Option<&PathBuf>) -> Result<NavGraph> {
    match path {
        Some(p) => fm_graph::load_from_path(p).with_context(|| format!("loading graph {}", p.display())),
        None => fm_graph::load_from_str(BUNDLED_GRAPH).context("parsing bundled graph"),
    }
}

fn print_status(fleet: &FleetManager, elapsed: Duration) {
    let graph = fleet.graph();
    let name = |v: VertexId| graph.vertex(v).map_or("?", |v| v.name.as_str());
    println!("t = {:>6.2}s", elapsed.as_secs_f64());
    for s in fleet.snapshots() {
        let target = s.target_vertex.map_or("-", name);
        println!(
            "  robot {:>2} {} {:<8} at {} on {:<10} -> {}",
            s.id.0,
            s.color,
            s.status.as_str(),
            s.position,
            name(s.current_vertex),
            target,
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let graph = load_graph(cli.graph.as_ref())?;
    if graph.is_empty() {
        bail!("navigation graph has no vertices");
    }
    let vertex_count = graph.vertex_count();

    let config = FleetConfig::default()
        .with_speed(cli.speed)
        .with_retry_jitter(Duration::from_millis(cli.jitter_ms), cli.seed);

    let log = Arc::new(LogFileSink::create(&cli.log).with_context(|| format!("creating {}", cli.log.display()))?);
    let mut fleet = FleetManagerBuilder::new(graph)
        .config(config)
        .sink(log.clone())
        .sink(Arc::new(TracingSink))
        .build()?;

    let mut csv = match &cli.csv_dir {
        Some(dir) => Some(CsvSnapshotWriter::new(dir).with_context(|| format!("creating CSV in {}", dir.display()))?),
        None => None,
    };

    // Spread robots over the vertex list and send each to its mirror vertex.
    let robots = cli.robots.min(vertex_count);
    for i in 0..robots {
        let start = VertexId::try_from(i * vertex_count / robots)?;
        let target = VertexId::try_from(vertex_count - 1 - start.index())?;
        let Some(robot) = fleet.spawn(start) else {
            continue;
        };
        if let Err(reason) = fleet.assign_task(robot.id(), target) {
            tracing::warn!(robot = robot.id().0, %reason, "task not accepted");
        }
    }

    let started = Instant::now();
    let interval = Duration::from_millis(cli.interval_ms.max(1));
    let deadline = started + Duration::from_secs(cli.timeout_secs);
    loop {
        if let Some(csv) = csv.as_mut() {
            csv.write_frame(&fleet.snapshots())?;
        }
        print_status(&fleet, started.elapsed());
        if fleet.wait_all_idle(interval) {
            break;
        }
        if Instant::now() >= deadline {
            tracing::warn!(timeout_secs = cli.timeout_secs, "robots still busy, stopping the fleet");
            fleet.stop_all();
            break;
        }
    }

    print_status(&fleet, started.elapsed());
    let traffic = fleet.traffic().snapshot();
    println!("lanes held: {}, queues: {}", traffic.held.len(), traffic.queued.len());

    if let Some(mut csv) = csv {
        csv.write_frame(&fleet.snapshots())?;
        csv.finish()?;
        println!("snapshots: {} ({} frames)", csv.path().display(), csv.frames());
    }
    if let Some(e) = log.take_error() {
        tracing::warn!(error = %e, "event log incomplete");
    }
    println!("log: {}", log.path().display());
    Ok(())
}
