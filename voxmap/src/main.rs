use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use voxmap_benchmark::MapMetrics;
use voxmap_cache::ChunkLoader;
use voxmap_gen::flat::FlatGenerator;
use voxmap_gen::terrain::TerrainGenerator;
use voxmap_gen::{GeneratedWorld, WorldGenerator};
use voxmap_render::{MapView, Marker, PixelCanvas, RenderConfig, ViewMode};

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Minimap,
    Full,
}

#[derive(Parser)]
#[command(name = "voxmap", about = "Render a top-down map of a generated voxel world")]
pub struct Args {
    /// World generator: "flat" or "terrain"
    #[arg(short, long, default_value = "flat", env = "VOXMAP_GENERATOR")]
    pub generator: String,

    /// World seed (for the terrain generator)
    #[arg(short, long, default_value = "0", env = "VOXMAP_SEED")]
    pub seed: u64,

    #[arg(long, default_value = "256")]
    pub width: u32,

    #[arg(long, default_value = "256")]
    pub height: u32,

    /// Camera position in world units
    #[arg(short = 'x', long, default_value = "0", allow_hyphen_values = true)]
    pub camera_x: f64,

    #[arg(short = 'z', long, default_value = "0", allow_hyphen_values = true)]
    pub camera_z: f64,

    #[arg(short, long, value_enum, default_value = "minimap")]
    mode: Mode,

    #[arg(long, default_value = "1")]
    pub zoom: f64,

    /// Explicit map size in world units (overrides zoom)
    #[arg(long)]
    pub map_size: Option<f64>,

    /// Minimap rotation in degrees, clockwise
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub heading: f64,

    /// JSON array of markers
    #[arg(long)]
    pub markers: Option<PathBuf>,

    /// JSON render config
    #[arg(short, long, env = "VOXMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only show markers of this world
    #[arg(long)]
    pub world: Option<String>,

    /// Chunks farther than this (Chebyshev, in chunks) from the origin are unavailable
    #[arg(long)]
    pub loaded_radius: Option<i32>,

    /// Simulated provider latency per chunk, in milliseconds
    #[arg(long, default_value = "0")]
    pub latency_ms: u64,

    /// Give up on outstanding chunks after this many seconds
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    #[arg(short, long, default_value = "map.ppm")]
    pub output: PathBuf,

    /// Print the metrics report when done
    #[arg(long)]
    pub report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };

    let markers: Vec<Marker> = match &args.markers {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read markers {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("Failed to parse markers {}", path.display()))?
        }
        None => Vec::new(),
    };

    // Select generator based on CLI args
    let generator: Arc<dyn WorldGenerator> = match args.generator.as_str() {
        "terrain" => {
            println!("Using TerrainGenerator with seed: {}", args.seed);
            Arc::new(TerrainGenerator::new(args.seed))
        }
        "flat" => {
            println!("Using FlatGenerator");
            Arc::new(FlatGenerator)
        }
        other => anyhow::bail!("unknown generator {:?}, expected \"flat\" or \"terrain\"", other),
    };

    let mut world = GeneratedWorld::new(generator).with_latency(Duration::from_millis(args.latency_ms));
    if let Some(radius) = args.loaded_radius {
        world = world.with_loaded_radius(radius);
    }

    let mode = match args.mode {
        Mode::Minimap => ViewMode::Bounded,
        Mode::Full => ViewMode::Unbounded,
    };
    let metrics = Arc::new(MapMetrics::new(format!(
        "{} seed={} {}x{} {:?} zoom={}",
        args.generator, args.seed, args.width, args.height, mode, args.zoom
    )));
    let loader = ChunkLoader::new(
        Arc::new(world),
        tokio::runtime::Handle::current(),
        metrics.clone(),
        config.shade_step,
        config.event_capacity,
    );

    let mut view = MapView::new(loader, Arc::new(markers), config, mode);
    view.attach_canvas(PixelCanvas::new(args.width, args.height))?;
    view.set_world(args.world.clone())?;
    match args.map_size {
        Some(size) => view.set_map_size(size)?,
        None => view.set_zoom(args.zoom)?,
    }
    view.set_heading(args.heading.to_radians())?;
    view.draw(args.camera_x, args.camera_z)?;

    let deadline = Duration::from_secs(args.timeout_secs);
    let waited = tokio::time::timeout(deadline, async {
        while view.pending_requests() > 0 {
            if view.wait_for_chunk().await?.is_none() {
                break;
            }
        }
        anyhow::Ok(())
    })
    .await;
    match waited {
        Ok(result) => result?,
        Err(_) => log::warn!("{} chunks still pending after {:?}", view.pending_requests(), deadline),
    }
    view.pump_events()?;

    let canvas = view.dispose().context("map view lost its canvas")?;
    let file = File::create(&args.output).with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut out = BufWriter::new(file);
    canvas
        .write_ppm(&mut out)
        .and_then(|_| out.flush())
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Wrote {}x{} map to {:?}", args.width, args.height, args.output);

    if args.report {
        println!("\n{}", metrics.generate_report());
    }
    Ok(())
}
