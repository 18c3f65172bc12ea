//! Layout engine for computing cell positions.
//!
//! This module handles:
//! - Pre-computing cell positions from column widths and row heights
//! - Binary search for efficient cell lookup at layout coordinates
//! - Merge range handling
//! - Caching one layout per sheet

mod cache;
mod grid;
mod merges;

pub use cache::LayoutCache;
pub use grid::{LayoutGrid, MergeInfo, Rect, MIN_COL_WIDTH, MIN_ROW_HEIGHT};
