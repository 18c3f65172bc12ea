//! Per-sheet layout cache.
//!
//! Layouts are computed on first access and shared as `Arc` snapshots, so a
//! frame being built keeps its grid alive even if the cache is cleared
//! underneath it.

use std::collections::HashMap;
use std::sync::Arc;

use super::LayoutGrid;
use crate::types::Sheet;

/// Lazily computed layouts keyed by sheet index.
#[derive(Debug, Default)]
pub struct LayoutCache {
    grids: HashMap<usize, Arc<LayoutGrid>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached layout of sheet `index`, computing it from `sheet` on a miss.
    pub fn get_or_compute(&mut self, index: usize, sheet: &Sheet) -> Arc<LayoutGrid> {
        Arc::clone(self.grids.entry(index).or_insert_with(|| {
            let grid = LayoutGrid::compute(sheet);
            tracing::debug!(
                sheet = index,
                rows = grid.row_count(),
                cols = grid.col_count(),
                "computed layout"
            );
            Arc::new(grid)
        }))
    }

    /// Cached layout without computing.
    pub fn get(&self, index: usize) -> Option<Arc<LayoutGrid>> {
        self.grids.get(&index).cloned()
    }

    /// Drop one sheet's layout; the next access recomputes it.
    pub fn invalidate(&mut self, index: usize) {
        self.grids.remove(&index);
    }

    pub fn clear(&mut self) {
        self.grids.clear();
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}
