use std::num::NonZeroUsize;

use image::RgbImage;
use itertools::{Either, Itertools};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::encode::{JpegTileEncoder, TileEncoder};
use crate::errors::{EncodeFailure, TileError};
use crate::grid::{tile_id, Cell, OverlapSpec, TileGrid};
use crate::ipr::{draw_registration_marks, HasTilingRoutines, IprImage};
use crate::paper::PaperProfile;
use crate::scale::{PhysicalSpec, Ppi};
use crate::source::SourceImage;

/// One encoded, paper-sized tile.
#[derive(Debug, Clone, Serialize)]
pub struct Tile {
    pub column_index: u32,
    pub row_index: u32,
    pub width: u32,
    pub height: u32,
    pub extension: &'static str,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Tile {
    pub fn id(&self) -> String {
        tile_id(self.column_index, self.row_index)
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id(), self.extension)
    }
}

/// Everything produced by one run.
///
/// `tiles` holds the tiles that encoded, in row-major order. Any tile that could not be encoded
/// is listed in `failures` instead, so a short result set is never mistaken for a whole one.
#[derive(Debug)]
pub struct TileRun {
    pub grid: TileGrid,
    pub tiles: Vec<Tile>,
    pub failures: Vec<EncodeFailure>,
}

impl TileRun {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Tiler {
    encoder: Box<dyn TileEncoder>,
    max_in_flight: Option<usize>,
    cancel: CancelToken,
}

impl Default for Tiler {
    fn default() -> Self {
        Self {
            encoder: Box::new(JpegTileEncoder::default()),
            max_in_flight: None,
            cancel: CancelToken::new(),
        }
    }
}

impl Tiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoder(mut self, encoder: Box<dyn TileEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Caps the number of tiles rasterized at once. Each in-flight tile holds a full raster
    /// buffer, see [`TileGrid::tile_buffer_bytes`].
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = Some(max_in_flight.max(1));
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Resolves the scale and lays out the grid without rendering anything.
    pub fn plan(
        &self,
        source: &SourceImage,
        target: PhysicalSpec,
        paper: &PaperProfile,
        overlap: OverlapSpec,
    ) -> Result<TileGrid, TileError> {
        let ppi = Ppi::resolve(source.width(), source.height(), target)?;
        let grid = TileGrid::plan(source.width(), source.height(), ppi, paper, overlap)?;
        info!(
            columns = grid.columns,
            rows = grid.rows,
            tile_width = grid.tile_width,
            tile_height = grid.tile_height,
            step_x = grid.step_x,
            step_y = grid.step_y,
            paper = %paper.name,
            "planned tile grid"
        );
        if !ppi.is_uniform() {
            debug!(
                ppi_x = ppi.x,
                ppi_y = ppi.y,
                "target aspect differs from source, print will stretch"
            );
        }
        Ok(grid)
    }

    pub fn run(
        &self,
        source: &SourceImage,
        target: PhysicalSpec,
        paper: &PaperProfile,
        overlap: OverlapSpec,
    ) -> Result<TileRun, TileError> {
        let grid = self.plan(source, target, paper, overlap)?;
        let cells: Vec<Cell> = grid.cells().collect();

        let workers = self.workers().min(cells.len()).max(1);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
        debug!(
            workers,
            buffer_bytes = grid.tile_buffer_bytes(),
            "rasterizing {} tiles",
            cells.len()
        );

        let outcomes = pool
            .install(|| {
                cells
                    .par_iter()
                    .map(|&cell| self.produce(source, &grid, paper, cell))
                    .collect::<Result<Vec<_>, TileError>>()
            })
            .inspect_err(|e| {
                if matches!(e, TileError::Cancelled) {
                    warn!("tiling cancelled, discarding partial output");
                }
            })?;

        let (mut tiles, mut failures): (Vec<Tile>, Vec<EncodeFailure>) =
            outcomes.into_iter().partition_map(|outcome| match outcome {
                Ok(tile) => Either::Left(tile),
                Err(failure) => Either::Right(failure),
            });
        tiles.sort_by_key(|t| (t.row_index, t.column_index));
        failures.sort_by_key(|f| (f.row_index, f.column_index));

        info!(
            produced = tiles.len(),
            failed = failures.len(),
            "tiling finished"
        );
        Ok(TileRun {
            grid,
            tiles,
            failures,
        })
    }

    fn workers(&self) -> usize {
        self.max_in_flight.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    fn produce(
        &self,
        source: &SourceImage,
        grid: &TileGrid,
        paper: &PaperProfile,
        cell: Cell,
    ) -> Result<Result<Tile, EncodeFailure>, TileError> {
        if self.cancel.is_cancelled() {
            return Err(TileError::Cancelled);
        }

        let raster = render_tile(source, grid, paper, cell);
        match self.encoder.encode(&raster) {
            Ok(data) => {
                debug!(tile = %cell.id(), bytes = data.len(), "encoded tile");
                Ok(Ok(Tile {
                    column_index: cell.col,
                    row_index: cell.row,
                    width: raster.width(),
                    height: raster.height(),
                    extension: self.encoder.extension(),
                    data,
                }))
            }
            Err(e) => {
                warn!(tile = %cell.id(), error = %e, "failed to encode tile");
                Ok(Err(EncodeFailure {
                    column_index: cell.col,
                    row_index: cell.row,
                    reason: e.to_string(),
                }))
            }
        }
    }
}

/// Renders the raster for one cell, registration marks included, without encoding it.
pub fn render_tile(
    source: &SourceImage,
    grid: &TileGrid,
    paper: &PaperProfile,
    cell: Cell,
) -> RgbImage {
    let mut raster = IprImage(source).rasterize_cell(grid, cell);
    if !paper.is_borderless() {
        draw_registration_marks(&mut raster);
    }
    raster
}

/// Splits `source` into paper-sized JPEG tiles using the default [`Tiler`].
pub fn tile(
    source: &SourceImage,
    target: PhysicalSpec,
    paper: &PaperProfile,
    overlap: OverlapSpec,
) -> Result<TileRun, TileError> {
    Tiler::default().run(source, target, paper, overlap)
}
