//! Splits one raster image into a grid of paper-sized tiles that, printed and assembled, reproduce
//! the image at a requested physical size.

//
// Modules
//

pub mod cancel;
pub mod config;
pub mod dims;
pub mod encode;
pub mod engine;
pub mod errors;
pub mod grid;
pub mod ipr;
pub mod paper;
pub mod scale;
pub mod source;

//
// Re-exports
//

pub use cancel::CancelToken;
pub use engine::{render_tile, tile, Tile, TileRun, Tiler};
pub use errors::{EncodeFailure, TileError};
pub use grid::{OverlapSpec, TileGrid};
pub use paper::PaperProfile;
pub use scale::PhysicalSpec;
pub use source::SourceImage;
