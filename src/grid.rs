use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::dims::HasDims;
use crate::errors::TileError;
use crate::paper::PaperProfile;
use crate::scale::Ppi;

/// Physical overlap, in inches, shared by neighbouring tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlapSpec {
    pub inches: f64,
}

impl OverlapSpec {
    pub fn new(inches: f64) -> Self {
        Self { inches }
    }

    pub fn none() -> Self {
        Self { inches: 0.0 }
    }
}

impl Default for OverlapSpec {
    fn default() -> Self {
        Self { inches: 0.25 }
    }
}

/// Slack applied before taking the ceiling so that a source whose size is an exact multiple of
/// the step does not pick up an extra row or column from floating point noise.
const CEIL_EPSILON: f64 = 1e-9;

/// Stable identifier of the tile at `(col, row)`, also used as its file stem.
pub fn tile_id(col: u32, row: u32) -> String {
    format!("tile_{col}_{row}")
}

/// One cell of a [`TileGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    // Field order gives the derived `Ord` row-major ordering.
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub fn new(col: u32, row: u32) -> Self {
        Self { row, col }
    }

    pub fn id(&self) -> String {
        tile_id(self.col, self.row)
    }
}

/// The grid of paper-sized tiles covering a source image.
///
/// Every tile is rendered at `tile_width x tile_height` pixels. Adjacent tile origins are
/// `step_x`/`step_y` pixels apart, which is less than the tile size whenever there is overlap,
/// so neighbouring tiles share a strip of the source.
///
/// ```text
///            step_x      step_x
///       ├───────────┼───────────┤
///       ┌──────────────┐
///       │  tile 0,0  ┌─┼────────────┐
///       │            │▒│  tile 1,0  │
///       │            │▒│            │
///       └────────────┼─┘            │
///                    └──────────────┘
///                    ├─┤ overlap
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileGrid {
    pub columns: u32,
    pub rows: u32,
    pub step_x: f64,
    pub step_y: f64,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl TileGrid {
    pub fn plan(
        source_width: u32,
        source_height: u32,
        ppi: Ppi,
        paper: &PaperProfile,
        overlap: OverlapSpec,
    ) -> Result<Self, TileError> {
        paper.validate()?;
        if source_width == 0 || source_height == 0 {
            return Err(TileError::decode(format!(
                "source image has no pixels ({source_width}x{source_height})"
            )));
        }

        let shortest_side = paper.width_in.min(paper.height_in);
        if !overlap.inches.is_finite() || overlap.inches < 0.0 {
            return Err(TileError::invalid_spec(format!(
                "overlap must be a non-negative number of inches, got {}",
                overlap.inches
            )));
        }
        if overlap.inches >= shortest_side {
            return Err(TileError::invalid_spec(format!(
                "overlap of {} in must be smaller than the shortest side of '{}' ({} in)",
                overlap.inches, paper.name, shortest_side
            )));
        }

        let step_x = (paper.width_in - overlap.inches) * ppi.x;
        let step_y = (paper.height_in - overlap.inches) * ppi.y;
        if !(step_x > 0.0 && step_y > 0.0) {
            return Err(TileError::invalid_spec(format!(
                "tile step must advance, got {step_x}x{step_y} px"
            )));
        }

        let tile_width = pixel_count(paper.width_in * ppi.x, "tile width")?;
        let tile_height = pixel_count(paper.height_in * ppi.y, "tile height")?;
        if tile_width == 0 || tile_height == 0 {
            return Err(TileError::invalid_spec(format!(
                "paper '{}' covers less than one source pixel ({}x{} px)",
                paper.name, tile_width, tile_height
            )));
        }

        let columns = pixel_count(
            (f64::from(source_width) / step_x - CEIL_EPSILON).ceil(),
            "columns",
        )?;
        let rows = pixel_count(
            (f64::from(source_height) / step_y - CEIL_EPSILON).ceil(),
            "rows",
        )?;

        Ok(Self {
            columns: columns.max(1),
            rows: rows.max(1),
            step_x,
            step_y,
            tile_width,
            tile_height,
        })
    }

    pub fn tile_count(&self) -> usize {
        self.dims().count()
    }

    /// Top-left corner, in source pixels, of the region sampled for `cell`.
    ///
    /// Truncated, so the origin of the last column and row always lies inside the source.
    pub fn source_origin(&self, cell: Cell) -> (u32, u32) {
        let x = (f64::from(cell.col) * self.step_x).floor();
        let y = (f64::from(cell.row) * self.step_y).floor();
        (x as u32, y as u32)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        iproduct!(0..self.rows, 0..self.columns).map(|(row, col)| Cell { row, col })
    }

    /// Bytes held by one RGBA working buffer while a tile is being rasterized.
    pub fn tile_buffer_bytes(&self) -> usize {
        self.tile_width as usize * self.tile_height as usize * 4
    }
}

impl HasDims for TileGrid {
    fn rows(&self) -> u32 {
        self.rows
    }

    fn cols(&self) -> u32 {
        self.columns
    }
}

fn pixel_count(value: f64, what: &str) -> Result<u32, TileError> {
    let value = value.round();
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(TileError::invalid_spec(format!("{what} out of range: {value}")));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dims::{Cols, Dims, Rows};
    use crate::scale::PhysicalSpec;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use test_case::test_case;

    fn a4() -> PaperProfile {
        PaperProfile::by_name("A4").unwrap()
    }

    fn plan_3000x4000(overlap_in: f64) -> Result<TileGrid, TileError> {
        let ppi = Ppi::resolve(3000, 4000, PhysicalSpec::new(15.0, 20.0))?;
        TileGrid::plan(3000, 4000, ppi, &a4(), OverlapSpec::new(overlap_in))
    }

    #[test]
    fn quarter_inch_overlap_on_a4() {
        let grid = plan_3000x4000(0.25).unwrap();
        assert_eq!((grid.tile_width, grid.tile_height), (1654, 2338));
        assert_eq!(grid.step_x.round(), 1604.0);
        assert_eq!(grid.step_y.round(), 2288.0);
        assert_eq!((grid.columns, grid.rows), (2, 2));
        assert_eq!(grid.tile_count(), 4);

        let ids: Vec<String> = grid.cells().map(|c| c.id()).collect();
        assert_eq!(ids, ["tile_0_0", "tile_1_0", "tile_0_1", "tile_1_1"]);
    }

    #[test]
    fn zero_overlap_steps_by_full_tile() {
        let grid = plan_3000x4000(0.0).unwrap();
        assert_eq!(grid.step_x.round() as u32, grid.tile_width);
        assert_eq!(grid.step_y.round() as u32, grid.tile_height);
        assert_eq!((grid.columns, grid.rows), (2, 2));
        assert_eq!(grid.source_origin(Cell::new(1, 1)), (1654, 2338));
    }

    #[test_case(12.0 ; "larger than the paper")]
    #[test_case(8.27 ; "equal to the short side")]
    #[test_case(-0.1 ; "negative")]
    #[test_case(f64::NAN ; "not a number")]
    fn rejects_degenerate_overlap(overlap_in: f64) {
        assert!(matches!(plan_3000x4000(overlap_in), Err(TileError::InvalidSpec(_))));
    }

    #[test]
    fn exact_multiple_does_not_add_a_column() {
        // 100 px per inch on a 2x2 in sheet: steps of exactly 200 px.
        let paper = PaperProfile::new("Square", 2.0, 2.0);
        let ppi = Ppi { x: 100.0, y: 100.0 };
        let grid = TileGrid::plan(600, 400, ppi, &paper, OverlapSpec::none()).unwrap();
        assert_eq!((grid.columns, grid.rows), (3, 2));
    }

    #[test]
    fn tiny_source_still_gets_one_tile() {
        let ppi = Ppi::resolve(10, 10, PhysicalSpec::new(1.0, 1.0)).unwrap();
        let grid = TileGrid::plan(10, 10, ppi, &a4(), OverlapSpec::default()).unwrap();
        assert_eq!((grid.columns, grid.rows), (1, 1));
        assert_eq!((grid.tile_width, grid.tile_height), (83, 117));
    }

    #[test]
    fn rejects_paper_smaller_than_a_pixel() {
        let ppi = Ppi::resolve(1, 1, PhysicalSpec::new(100.0, 100.0)).unwrap();
        let result = TileGrid::plan(1, 1, ppi, &a4(), OverlapSpec::none());
        assert!(matches!(result, Err(TileError::InvalidSpec(_))));
    }

    #[test]
    fn empty_source_is_a_decode_failure() {
        let ppi = Ppi { x: 200.0, y: 200.0 };
        let result = TileGrid::plan(0, 4000, ppi, &a4(), OverlapSpec::none());
        assert!(matches!(result, Err(TileError::DecodeFailure(_))));
    }

    #[test]
    fn more_overlap_never_means_fewer_tiles() {
        let mut rng = StdRng::seed_from_u64(0x711e);
        for _ in 0..50 {
            let width = rng.gen_range(1..20_000);
            let height = rng.gen_range(1..20_000);
            let target = PhysicalSpec::new(rng.gen_range(1.0..80.0), rng.gen_range(1.0..80.0));
            let ppi = Ppi::resolve(width, height, target).unwrap();

            let mut overlaps: Vec<f64> = (0..8).map(|_| rng.gen_range(0.0..8.0)).collect();
            overlaps.sort_by(f64::total_cmp);

            let mut previous = (0, 0);
            for overlap_in in overlaps {
                let overlap = OverlapSpec::new(overlap_in);
                let grid = match TileGrid::plan(width, height, ppi, &a4(), overlap) {
                    Ok(grid) => grid,
                    // Only possible when a sheet covers less than a pixel, independent of overlap.
                    Err(TileError::InvalidSpec(_)) => break,
                    Err(e) => panic!("unexpected error: {e}"),
                };
                assert!(grid.columns >= previous.0 && grid.rows >= previous.1);
                previous = (grid.columns, grid.rows);
            }
        }
    }

    #[test]
    fn last_origin_stays_inside_fractional_step() {
        // 499.9 px per step, so the third column starts at x = 999.8.
        let ppi = Ppi::resolve(1000, 100, PhysicalSpec::new(2.0004, 1.0)).unwrap();
        let paper = PaperProfile::new("Square", 1.0, 1.0);
        let grid = TileGrid::plan(1000, 100, ppi, &paper, OverlapSpec::none()).unwrap();
        assert_eq!(grid.columns, 3);
        assert_eq!(grid.source_origin(Cell::new(2, 0)), (999, 0));
    }

    #[test]
    fn every_origin_lies_within_the_source() {
        let mut rng = StdRng::seed_from_u64(0x0419);
        for _ in 0..200 {
            let width = rng.gen_range(1..5_000);
            let height = rng.gen_range(1..5_000);
            let target = PhysicalSpec::new(rng.gen_range(1.0..60.0), rng.gen_range(1.0..60.0));
            let ppi = Ppi::resolve(width, height, target).unwrap();
            let overlap = OverlapSpec::new(rng.gen_range(0.0..4.0));
            let Ok(grid) = TileGrid::plan(width, height, ppi, &a4(), overlap) else {
                continue;
            };

            let (x, y) = grid.source_origin(Cell::new(grid.columns - 1, grid.rows - 1));
            assert!(x < width && y < height, "{width}x{height} {grid:?} -> ({x}, {y})");
        }
    }

    #[test]
    fn dims_follow_rows_then_cols() {
        let grid = plan_3000x4000(0.25).unwrap();
        let Dims(Rows(r), Cols(c)) = grid.dims();
        assert_eq!((r, c), (2, 2));
    }

    #[test]
    fn cells_sort_row_major() {
        let mut cells = vec![Cell::new(1, 0), Cell::new(0, 1), Cell::new(0, 0), Cell::new(1, 1)];
        cells.sort();
        assert_eq!(cells, [Cell::new(0, 0), Cell::new(1, 0), Cell::new(0, 1), Cell::new(1, 1)]);
    }
}
