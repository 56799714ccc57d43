//
// Uses
//

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tileprint::config::{JobConfig, OutputFormat};
use tileprint::dims::HasDims;
use tileprint::paper;
use tileprint::{PaperProfile, PhysicalSpec, SourceImage, Tile, TileError, TileGrid, TileRun};

//
// Implementation
//

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Split one image into printable paper-sized tiles that assemble into a poster of a given physical size"
)]
struct Args {
    /// Path to the image to split
    #[arg(long, value_name = "PATH", required_unless_present = "list_papers")]
    input: Option<PathBuf>,

    /// Directory where tiles and the manifest will be written
    #[arg(long, value_name = "PATH", required_unless_present_any = ["list_papers", "dry_run"])]
    output: Option<PathBuf>,

    /// JSON job file. Flags given on the command line take precedence
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Width of the assembled print, in inches
    #[arg(long, value_name = "INCHES")]
    width: Option<f64>,

    /// Height of the assembled print, in inches
    #[arg(long, value_name = "INCHES")]
    height: Option<f64>,

    /// Paper from the built-in catalog (see --list-papers)
    #[arg(long, value_name = "STR")]
    paper: Option<String>,

    /// Custom paper width, in inches
    #[arg(long, value_name = "INCHES", requires = "paper_height")]
    paper_width: Option<f64>,

    /// Custom paper height, in inches
    #[arg(long, value_name = "INCHES", requires = "paper_width")]
    paper_height: Option<f64>,

    /// Print full-bleed, without registration marks
    #[arg(long)]
    borderless: bool,

    /// Overlap between neighbouring tiles, in inches
    #[arg(long, value_name = "INCHES")]
    overlap: Option<f64>,

    /// Encoding of the written tiles
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JPEG quality, 1-100
    #[arg(long, value_name = "INT")]
    quality: Option<u8>,

    /// Maximum number of tiles rendered at the same time
    #[arg(long, value_name = "INT")]
    jobs: Option<usize>,

    /// Only report the grid that would be produced
    #[arg(long)]
    dry_run: bool,

    /// List the built-in paper sizes and exit
    #[arg(long)]
    list_papers: bool,
}

impl Args {
    fn job_config(&self) -> Result<JobConfig, TileError> {
        let mut config = match &self.config {
            Some(path) => JobConfig::from_json_file(path)?,
            None => JobConfig::default(),
        };

        if let Some(w) = self.width {
            config.target_width_in = w;
        }
        if let Some(h) = self.height {
            config.target_height_in = h;
        }
        if let Some(paper) = &self.paper {
            config.paper = paper.clone();
            config.paper_width_in = None;
            config.paper_height_in = None;
        }
        if self.paper_width.is_some() {
            config.paper_width_in = self.paper_width;
            config.paper_height_in = self.paper_height;
        }
        if self.borderless {
            config.borderless = Some(true);
        }
        if let Some(overlap) = self.overlap {
            config.overlap_in = overlap;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if self.jobs.is_some() {
            config.max_in_flight = self.jobs;
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct ManifestTile<'a> {
    id: String,
    file: String,
    #[serde(flatten)]
    tile: &'a Tile,
}

#[derive(Serialize)]
struct Manifest<'a> {
    paper: &'a PaperProfile,
    target: PhysicalSpec,
    overlap_in: f64,
    grid: &'a TileGrid,
    tiles: Vec<ManifestTile<'a>>,
    failed: Vec<String>,
}

fn write_tiles(
    output: &Path,
    run: &TileRun,
    config: &JobConfig,
    paper: &PaperProfile,
) -> Result<(), TileError> {
    std::fs::create_dir_all(output)?;

    for tile in &run.tiles {
        let path = output.join(tile.file_name());
        std::fs::write(&path, &tile.data)?;
        info!("Saved tile to {}", path.display());
    }

    let manifest = Manifest {
        paper,
        target: config.target(),
        overlap_in: config.overlap_in,
        grid: &run.grid,
        tiles: run
            .tiles
            .iter()
            .map(|tile| ManifestTile {
                id: tile.id(),
                file: tile.file_name(),
                tile,
            })
            .collect(),
        failed: run.failures.iter().map(|f| f.id()).collect(),
    };
    let manifest_path = output.join("manifest.json");
    let json = serde_json::to_vec_pretty(&manifest)?;
    std::fs::write(&manifest_path, json)?;
    info!("Wrote manifest to {}", manifest_path.display());
    Ok(())
}

fn run(args: &Args) -> Result<ExitCode, TileError> {
    if args.list_papers {
        for p in paper::catalog() {
            let kind = if p.is_borderless() { "borderless" } else { "with marks" };
            println!("{:<16} {:>6} x {:<6} in  ({})", p.name, p.width_in, p.height_in, kind);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = args.job_config()?;
    let paper = config.paper_profile()?;
    let tiler = config.tiler()?;

    let input = args
        .input
        .as_ref()
        .ok_or_else(|| TileError::invalid_spec("--input is required"))?;
    let source = SourceImage::open(input)?;

    if args.dry_run {
        let grid = tiler.plan(&source, config.target(), &paper, config.overlap())?;
        println!(
            "{}\" x {}\" • {} Pages ({}), {} columns x {} rows of {}x{} px",
            config.target_width_in,
            config.target_height_in,
            grid.tile_count(),
            paper.name,
            grid.cols(),
            grid.rows(),
            grid.tile_width,
            grid.tile_height
        );
        return Ok(ExitCode::SUCCESS);
    }

    let output = args
        .output
        .as_ref()
        .ok_or_else(|| TileError::invalid_spec("--output is required"))?;
    let result = tiler.run(&source, config.target(), &paper, config.overlap())?;
    write_tiles(output, &result, &config, &paper)?;

    if result.is_complete() {
        info!("Wrote {} tiles", result.tiles.len());
        Ok(ExitCode::SUCCESS)
    } else {
        for failure in &result.failures {
            error!("{}", failure);
        }
        error!(
            "Incomplete print job: {} of {} tiles failed",
            result.failures.len(),
            result.grid.tile_count()
        );
        Ok(ExitCode::FAILURE)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
