//! Merge lookup by row and column bands.
//!
//! Band boundaries are the first and one-past-last index of every region, so
//! the set of regions crossing a band is the same for every index inside it.
//! Building and querying cost depends on the number of regions, never on
//! their area.

use crate::types::MergeRegion;

/// Regions bucketed into bands along one axis.
#[derive(Debug, Clone, Default)]
struct Bands {
    /// First index of each band; band `i` ends where band `i + 1` starts.
    starts: Vec<u32>,
    /// Per band, the regions crossing it, sorted by their start on the other axis.
    members: Vec<Vec<usize>>,
}

impl Bands {
    fn build(
        regions: &[MergeRegion],
        span: impl Fn(&MergeRegion) -> (u32, u32),
        across: impl Fn(&MergeRegion) -> u32,
    ) -> Self {
        let mut starts: Vec<u32> = regions
            .iter()
            .flat_map(|r| {
                let (first, last) = span(r);
                [first, last.saturating_add(1)]
            })
            .collect();
        starts.sort_unstable();
        starts.dedup();

        let mut pending: Vec<(usize, &MergeRegion)> = regions.iter().enumerate().collect();
        pending.sort_by_key(|(_, r)| span(r).0);
        let mut pending = pending.into_iter().peekable();

        let mut active: Vec<(usize, &MergeRegion)> = Vec::new();
        let mut members = Vec::with_capacity(starts.len());
        for &start in &starts {
            active.retain(|(_, r)| span(r).1 >= start);
            while let Some(entry) = pending.next_if(|(_, r)| span(r).0 <= start) {
                active.push(entry);
            }
            active.sort_by_key(|(_, r)| across(r));
            members.push(active.iter().map(|&(id, _)| id).collect());
        }

        Self { starts, members }
    }

    /// Regions crossing index `at`.
    fn at(&self, at: u32) -> &[usize] {
        self.starts
            .partition_point(|&s| s <= at)
            .checked_sub(1)
            .and_then(|band| self.members.get(band))
            .map_or(&[], Vec::as_slice)
    }
}

/// Non-overlapping merged regions with logarithmic point lookup.
#[derive(Debug, Clone, Default)]
pub(super) struct MergeIndex {
    regions: Vec<MergeRegion>,
    /// Row bands; members ordered by start column
    by_row: Bands,
    /// Column bands; members ordered by start row
    by_col: Bands,
}

impl MergeIndex {
    pub(super) fn new(regions: Vec<MergeRegion>) -> Self {
        let by_row = Bands::build(&regions, |r| (r.start_row, r.end_row), |r| r.start_col);
        let by_col = Bands::build(&regions, |r| (r.start_col, r.end_col), |r| r.start_row);
        Self {
            regions,
            by_row,
            by_col,
        }
    }

    fn crossing<'a>(&'a self, bands: &'a Bands, at: u32) -> impl Iterator<Item = &'a MergeRegion> {
        bands.at(at).iter().filter_map(|&id| self.regions.get(id))
    }

    /// Region covering a cell.
    pub(super) fn find(&self, row: u32, col: u32) -> Option<&MergeRegion> {
        let band = self.by_row.at(row);
        // Regions crossing one row are disjoint in columns.
        let pos = band
            .partition_point(|&id| self.regions.get(id).is_some_and(|r| r.start_col <= col))
            .checked_sub(1)?;
        let region = self.regions.get(*band.get(pos)?)?;
        region.contains(row, col).then_some(region)
    }

    /// Column ranges `[start, end)` where the top edge of `row` runs through a
    /// region, in column order.
    pub(super) fn hline_skips(&self, row: u32) -> Vec<(u32, u32)> {
        self.crossing(&self.by_row, row)
            .filter(|r| r.start_row < row)
            .map(|r| (r.start_col, r.end_col.saturating_add(1)))
            .collect()
    }

    /// Row ranges `[start, end)` where the left edge of `col` runs through a
    /// region, in row order.
    pub(super) fn vline_skips(&self, col: u32) -> Vec<(u32, u32)> {
        self.crossing(&self.by_col, col)
            .filter(|r| r.start_col < col)
            .map(|r| (r.start_row, r.end_row.saturating_add(1)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> MergeRegion {
        MergeRegion {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }

    #[test]
    fn bands_split_at_region_edges() {
        let index = MergeIndex::new(vec![region(2, 0, 5, 1), region(4, 3, 9, 3)]);
        assert_eq!(index.by_row.starts, vec![2, 4, 6, 10]);
        assert!(index.by_row.at(1).is_empty());
        assert_eq!(index.by_row.at(2), &[0]);
        assert_eq!(index.by_row.at(5), &[0, 1]);
        assert_eq!(index.by_row.at(7), &[1]);
        assert!(index.by_row.at(10).is_empty());
    }

    #[test]
    fn lookup_finds_the_covering_region() {
        let index = MergeIndex::new(vec![
            region(0, 0, 1, 1),
            region(0, 2, 0, 4),
            region(3, 1, 8, 2),
        ]);
        assert_eq!(index.find(1, 1), Some(&region(0, 0, 1, 1)));
        assert_eq!(index.find(0, 4), Some(&region(0, 2, 0, 4)));
        assert_eq!(index.find(8, 1), Some(&region(3, 1, 8, 2)));
        assert_eq!(index.find(1, 2), None);
        assert_eq!(index.find(5, 0), None);
        assert_eq!(index.find(5, 3), None);
        assert_eq!(index.find(9, 1), None);
    }

    #[test]
    fn skips_cover_interior_edges_only() {
        let index = MergeIndex::new(vec![region(1, 1, 2, 3), region(1, 5, 4, 6)]);
        assert!(index.hline_skips(1).is_empty());
        assert_eq!(index.hline_skips(2), vec![(1, 4), (5, 7)]);
        assert_eq!(index.hline_skips(3), vec![(5, 7)]);
        assert!(index.vline_skips(1).is_empty());
        assert_eq!(index.vline_skips(2), vec![(1, 3)]);
        assert_eq!(index.vline_skips(6), vec![(1, 5)]);
        assert!(index.vline_skips(7).is_empty());
    }

    #[test]
    fn empty_index_finds_nothing() {
        let index = MergeIndex::default();
        assert_eq!(index.find(0, 0), None);
        assert!(index.hline_skips(3).is_empty());
    }
}
