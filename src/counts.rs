//! Live-neighbor counting over the Moore neighborhood.
//!
//! Two strategies: recompute a cell's count from the grid on demand, or
//! keep a persistent count array and adjust it by ±1 around every flipped
//! cell. After any committed generation the incremental counts must equal a
//! fresh recount exactly; a count leaving `0..=8` means the bookkeeping is
//! corrupt and aborts.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// How per-cell live-neighbor counts are obtained during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CountStrategy {
    /// Sum the 8 neighbor states from the grid each time a count is needed.
    /// No auxiliary state; always correct.
    Recompute,
    /// Keep a persistent count array, seeded once and then adjusted by ±1
    /// around each flip. Per-generation bookkeeping is O(flipped cells)
    /// instead of O(N²).
    #[default]
    Incremental,
}

/// Flat indices of the 8 toroidal Moore neighbors of (row, col).
///
/// On tiny grids the offsets can land on the same cell more than once
/// (on a 1×1 torus a cell is its own neighbor 8 times); duplicates are
/// intentional and counted each time.
pub(crate) fn neighbor_indices(n: usize, row: usize, col: usize) -> [usize; 8] {
    let left = if col == 0 { n - 1 } else { col - 1 };
    let right = if col == n - 1 { 0 } else { col + 1 };
    let above = if row == 0 { n - 1 } else { row - 1 };
    let below = if row == n - 1 { 0 } else { row + 1 };

    [
        above * n + left,
        above * n + col,
        above * n + right,
        row * n + left,
        row * n + right,
        below * n + left,
        below * n + col,
        below * n + right,
    ]
}

/// Counts the live cells among the 8 toroidal neighbors of (row, col).
pub fn live_neighbors(grid: &Grid, row: usize, col: usize) -> u8 {
    let cells = grid.cells();
    let mut count = 0u8;
    for idx in neighbor_indices(grid.size(), row, col) {
        count += cells[idx] as u8;
    }
    count
}

/// Persistent per-cell live-neighbor counts (the incremental strategy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborCounts {
    /// Side length N of the tracked grid.
    n: usize,
    /// Per-cell counts, row-major, each in `0..=8`.
    counts: Vec<u8>,
}

impl NeighborCounts {
    /// Seeds counts by summing all 8 neighbors of every cell. One-time
    /// O(N²) cost at construction.
    pub fn seed(grid: &Grid) -> Self {
        let n = grid.size();
        let mut counts = Vec::with_capacity(n * n);
        for row in 0..n {
            for col in 0..n {
                counts.push(live_neighbors(grid, row, col));
            }
        }
        Self { n, counts }
    }

    /// Returns the count for a cell; row and col wrap modulo N.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.counts[(row % self.n) * self.n + col % self.n]
    }

    /// Returns the flat count buffer in row-major order.
    pub fn as_slice(&self) -> &[u8] {
        &self.counts
    }

    /// Records a dead→alive flip at (row, col): every neighbor's count
    /// rises by 1. Must be called exactly once per flip.
    pub(crate) fn increment_around(&mut self, row: usize, col: usize) {
        for idx in neighbor_indices(self.n, row, col) {
            let count = &mut self.counts[idx];
            assert!(*count < 8, "neighbor count above 8: incremental bookkeeping is corrupt");
            *count += 1;
        }
    }

    /// Records an alive→dead flip at (row, col): every neighbor's count
    /// drops by 1. Must be called exactly once per flip.
    pub(crate) fn decrement_around(&mut self, row: usize, col: usize) {
        for idx in neighbor_indices(self.n, row, col) {
            let count = &mut self.counts[idx];
            assert!(*count > 0, "neighbor count below 0: incremental bookkeeping is corrupt");
            *count -= 1;
        }
    }
}
