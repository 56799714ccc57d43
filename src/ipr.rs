use image::{imageops, GenericImageView, Rgb, RgbImage, Rgba};

use crate::grid::{Cell, TileGrid};
use crate::source::SourceImage;

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

pub const MARK_COLOR: Rgb<u8> = Rgb([0xCC, 0xCC, 0xCC]);
pub const MARK_LENGTH: u32 = 20;
pub const MARK_THICKNESS: u32 = 2;

pub struct IprImage<'a>(pub &'a SourceImage);

pub trait HasTilingRoutines {
    fn rasterize_cell(&self, grid: &TileGrid, cell: Cell) -> RgbImage;
}

impl<'a> HasTilingRoutines for IprImage<'a> {
    /// Renders the region of the source covered by `cell` onto a paper-sized canvas.
    ///
    /// The region is copied 1:1 to the top-left of the canvas. Whatever part of the region falls
    /// past the right or bottom edge of the source stays white, as does anything behind
    /// transparent source pixels.
    ///
    /// ```text
    ///        source                    canvas (tile 1,0)
    ///  ┌─────────────┬─────┐        ┌───────────┬───────┐
    ///  │             │     │        │           │       │
    ///  │   tile 0,0  │ 1,0 │ ─────▶ │  source   │ white │
    ///  │             │     │        │  pixels   │       │
    ///  └─────────────┴─────┘        └───────────┴───────┘
    /// ```
    fn rasterize_cell(&self, grid: &TileGrid, cell: Cell) -> RgbImage {
        let source = self.0.pixels();
        let mut canvas = RgbImage::from_pixel(grid.tile_width, grid.tile_height, BACKGROUND);

        let (x, y) = grid.source_origin(cell);
        if x < source.width() && y < source.height() {
            // crop_imm clamps the region to the source bounds
            let region = imageops::crop_imm(source, x, y, grid.tile_width, grid.tile_height);
            for (dx, dy, pixel) in region.pixels() {
                canvas.put_pixel(dx, dy, over_background(pixel));
            }
        }

        canvas
    }
}

/// Composites a possibly translucent source pixel over the white background.
fn over_background(Rgba([r, g, b, a]): Rgba<u8>) -> Rgb<u8> {
    let a = u32::from(a);
    let mix = |c: u8| ((u32::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
    Rgb([mix(r), mix(g), mix(b)])
}

/// Draws L-shaped alignment marks at the top-left and bottom-right corners of a tile.
///
/// The top-right and bottom-left corners are left unmarked.
pub fn draw_registration_marks(tile: &mut RgbImage) {
    let (w, h) = tile.dimensions();
    let far_x = w.saturating_sub(MARK_LENGTH);
    let far_y = h.saturating_sub(MARK_LENGTH);
    let edge_x = w.saturating_sub(MARK_THICKNESS);
    let edge_y = h.saturating_sub(MARK_THICKNESS);

    // Top-left, running right and down.
    fill_rect(tile, 0, 0, MARK_LENGTH, MARK_THICKNESS, MARK_COLOR);
    fill_rect(tile, 0, 0, MARK_THICKNESS, MARK_LENGTH, MARK_COLOR);

    // Bottom-right, running left and up.
    fill_rect(tile, far_x, edge_y, MARK_LENGTH, MARK_THICKNESS, MARK_COLOR);
    fill_rect(tile, edge_x, far_y, MARK_THICKNESS, MARK_LENGTH, MARK_COLOR);
}

fn fill_rect(image: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(width).min(image.width());
    let y_end = y.saturating_add(height).min(image.height());
    for py in y..y_end {
        for px in x..x_end {
            image.put_pixel(px, py, color);
        }
    }
}
