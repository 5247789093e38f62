//! One-generation step execution, sequential or row-banded parallel.
//!
//! Every transition decision in generation *t* reads only generation
//! *t − 1*'s committed snapshot: the scan writes flips into a staged cell
//! buffer and collects them as deltas, and the primary buffers are replaced
//! by swap only after the whole scan (and, in parallel mode, the join)
//! finishes. Visitation order therefore cannot affect the result, and a
//! step commits fully or not at all.
//!
//! In parallel mode the N rows are split into one contiguous band per
//! worker, the last band absorbing any remainder rows. Each worker holds a
//! disjoint `&mut` slice of the staged cell buffer for exactly its own
//! band, reads the shared pre-step snapshot without locking, and returns
//! its flip list. A flip's neighbor-count deltas touch rows owned by
//! adjacent bands, so workers never write counts at all: the collected
//! flips are applied to the staged count buffer in a single-threaded
//! reconciliation pass after the join. Delta application is commutative,
//! so the parallel result is bit-identical to the sequential one.

use std::thread;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::counts::{self, CountStrategy, NeighborCounts};
use crate::error::EngineError;
use crate::grid::Grid;
use crate::rule::Rule;

/// A single cell whose state changed during a committed step.
///
/// Sufficient for a renderer to redraw only changed pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellDelta {
    /// Row of the flipped cell.
    pub row: usize,
    /// Column of the flipped cell.
    pub col: usize,
    /// The cell's new state.
    pub alive: bool,
}

/// Consumer of per-cell change events, e.g. a renderer redrawing changed
/// pixels. The engine never holds display state itself.
///
/// Implemented for any `FnMut(CellDelta)` closure.
pub trait RenderSink {
    /// Called once per flipped cell after a generation commits.
    fn cell_changed(&mut self, delta: CellDelta);
}

impl<F: FnMut(CellDelta)> RenderSink for F {
    fn cell_changed(&mut self, delta: CellDelta) {
        self(delta);
    }
}

/// Cellular-automaton evolution engine over a fixed-size toroidal grid.
///
/// Owns the grid, the optional incremental neighbor counts, and the staged
/// generation buffers. Constructed from an explicit seed or a probabilistic
/// fill, then advanced one generation at a time with [`Engine::step`].
#[derive(Debug, Clone)]
pub struct Engine {
    grid: Grid,
    /// Staged cell buffer for the generation being computed.
    next_cells: Vec<bool>,
    /// Primary counts; `None` under the recompute strategy.
    counts: Option<NeighborCounts>,
    /// Staged counts, swapped in at commit.
    next_counts: Option<NeighborCounts>,
    strategy: CountStrategy,
    rule: Rule,
    workers: usize,
    generation: u64,
}

impl Engine {
    /// Creates an engine around an existing grid.
    pub fn new(grid: Grid, rule: Rule, strategy: CountStrategy) -> Self {
        let counts = match strategy {
            CountStrategy::Incremental => Some(NeighborCounts::seed(&grid)),
            CountStrategy::Recompute => None,
        };
        let next_cells = grid.cells().to_vec();
        let next_counts = counts.clone();

        debug!(n = grid.size(), ?strategy, "engine constructed");

        Self {
            grid,
            next_cells,
            counts,
            next_counts,
            strategy,
            rule,
            workers: 1,
            generation: 0,
        }
    }

    /// Creates an engine from an explicit seed of exactly `n * n` cells.
    pub fn from_cells(
        n: usize,
        cells: Vec<bool>,
        rule: Rule,
        strategy: CountStrategy,
    ) -> Result<Self, EngineError> {
        Ok(Self::new(Grid::from_cells(n, cells)?, rule, strategy))
    }

    /// Creates an engine over a random grid with the given alive
    /// probability, drawn from an entropy-seeded source.
    pub fn random(
        n: usize,
        alive_probability: f64,
        rule: Rule,
        strategy: CountStrategy,
    ) -> Result<Self, EngineError> {
        Ok(Self::new(Grid::random(n, alive_probability)?, rule, strategy))
    }

    /// Like [`Engine::random`], but fully deterministic for a given seed.
    pub fn random_seeded(
        n: usize,
        alive_probability: f64,
        seed: u64,
        rule: Rule,
        strategy: CountStrategy,
    ) -> Result<Self, EngineError> {
        Ok(Self::new(
            Grid::random_seeded(n, alive_probability, seed)?,
            rule,
            strategy,
        ))
    }

    /// Sets the number of worker threads a step fans out to. With 1 the
    /// step runs on the caller's thread. Zero is rejected.
    pub fn set_workers(&mut self, workers: usize) -> Result<(), EngineError> {
        if workers == 0 {
            return Err(EngineError::ZeroWorkers);
        }
        self.workers = workers;
        Ok(())
    }

    /// Returns the configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns the transition rule.
    pub fn rule(&self) -> Rule {
        self.rule
    }

    /// Replaces the transition rule.
    pub fn set_rule(&mut self, rule: Rule) {
        self.rule = rule;
    }

    /// Returns the neighbor-count strategy.
    pub fn strategy(&self) -> CountStrategy {
        self.strategy
    }

    /// Read-only access to the current committed grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Number of committed generations since construction.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Gets a cell's state; row and col wrap modulo N.
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.grid.get(row, col)
    }

    /// Sets a single cell between steps, keeping incremental counts in
    /// sync. Intended for seeding patterns; row and col wrap modulo N.
    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        let n = self.grid.size();
        let (row, col) = (row % n, col % n);
        if self.grid.get(row, col) == alive {
            return;
        }
        self.grid.set(row, col, alive);
        if let Some(counts) = self.counts.as_mut() {
            if alive {
                counts.increment_around(row, col);
            } else {
                counts.decrement_around(row, col);
            }
        }
    }

    /// Current per-cell live-neighbor counts, row-major. Diagnostic: a
    /// clone of the tracked array under the incremental strategy, a fresh
    /// recount under recompute.
    pub fn neighbor_counts(&self) -> Vec<u8> {
        match &self.counts {
            Some(counts) => counts.as_slice().to_vec(),
            None => NeighborCounts::seed(&self.grid).as_slice().to_vec(),
        }
    }

    /// Advances the grid by exactly one generation and returns the cells
    /// that flipped, in row-major order of discovery.
    pub fn step(&mut self) -> Vec<CellDelta> {
        let n = self.grid.size();
        self.next_cells.copy_from_slice(self.grid.cells());

        let deltas = if self.workers == 1 {
            Self::scan_band(
                &self.grid,
                self.counts.as_ref(),
                &self.rule,
                &mut self.next_cells,
                0,
                n,
            )
        } else {
            self.scan_parallel(n)
        };

        self.commit(&deltas);
        deltas
    }

    /// Advances one generation and forwards each flip to `sink`.
    pub fn step_with_sink<S: RenderSink + ?Sized>(&mut self, sink: &mut S) -> Vec<CellDelta> {
        let deltas = self.step();
        for &delta in &deltas {
            sink.cell_changed(delta);
        }
        deltas
    }

    /// Advances multiple generations.
    pub fn steps(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Evaluates the rule over rows `start_row .. start_row + rows`,
    /// writing flips into `band` (the staged slice for exactly those rows)
    /// and returning them. Reads only the pre-step snapshot.
    fn scan_band(
        grid: &Grid,
        counts: Option<&NeighborCounts>,
        rule: &Rule,
        band: &mut [bool],
        start_row: usize,
        rows: usize,
    ) -> Vec<CellDelta> {
        let n = grid.size();
        let cells = grid.cells();
        let mut deltas = Vec::new();

        for row in start_row..start_row + rows {
            for col in 0..n {
                let alive = cells[row * n + col];
                let neighbors = match counts {
                    Some(counts) => counts.get(row, col),
                    None => counts::live_neighbors(grid, row, col),
                };
                let next = rule.next_state(alive, neighbors);
                if next != alive {
                    band[(row - start_row) * n + col] = next;
                    deltas.push(CellDelta { row, col, alive: next });
                }
            }
        }

        deltas
    }

    /// Fans the scan out over `self.workers` row bands. Workers are spawned
    /// for this step only and all joined before the caller commits.
    fn scan_parallel(&mut self, n: usize) -> Vec<CellDelta> {
        let workers = self.workers;
        let rows_per_band = n / workers;
        let grid = &self.grid;
        let counts = self.counts.as_ref();
        let rule = &self.rule;
        let mut rest = self.next_cells.as_mut_slice();
        let mut deltas = Vec::new();

        thread::scope(|s| {
            let mut handles = Vec::with_capacity(workers);
            for worker in 0..workers {
                let start_row = worker * rows_per_band;
                // The last band absorbs the remainder rows.
                let rows = if worker == workers - 1 {
                    n - start_row
                } else {
                    rows_per_band
                };
                let (band, tail) = std::mem::take(&mut rest).split_at_mut(rows * n);
                rest = tail;
                handles
                    .push(s.spawn(move || Self::scan_band(grid, counts, rule, band, start_row, rows)));
            }
            assert!(rest.is_empty(), "row bands must cover the whole grid exactly once");

            for handle in handles {
                match handle.join() {
                    Ok(mut band_deltas) => deltas.append(&mut band_deltas),
                    Err(payload) => std::panic::resume_unwind(payload),
                }
            }
        });

        deltas
    }

    /// Replaces the primary buffers with the staged generation. Under the
    /// incremental strategy the staged counts are rebuilt from the pre-step
    /// counts plus one delta application per flip, single-threaded.
    fn commit(&mut self, deltas: &[CellDelta]) {
        if let (Some(counts), Some(staged)) = (self.counts.as_mut(), self.next_counts.as_mut()) {
            staged.clone_from(counts);
            for delta in deltas {
                if delta.alive {
                    staged.increment_around(delta.row, delta.col);
                } else {
                    staged.decrement_around(delta.row, delta.col);
                }
            }
            std::mem::swap(counts, staged);
        }

        std::mem::swap(self.grid.cells_mut(), &mut self.next_cells);
        self.generation += 1;

        trace!(
            generation = self.generation,
            flips = deltas.len(),
            "generation committed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counts::live_neighbors;

    fn engine_from(n: usize, alive: &[(usize, usize)], strategy: CountStrategy) -> Engine {
        let mut cells = vec![false; n * n];
        for &(row, col) in alive {
            cells[row * n + col] = true;
        }
        Engine::from_cells(n, cells, Rule::conway(), strategy).unwrap()
    }

    fn assert_counts_consistent(engine: &Engine) {
        let n = engine.grid().size();
        let counts = engine.neighbor_counts();
        for row in 0..n {
            for col in 0..n {
                assert_eq!(
                    counts[row * n + col],
                    live_neighbors(engine.grid(), row, col),
                    "count mismatch at ({row}, {col})"
                );
            }
        }
    }

    #[test]
    fn test_block_still_life() {
        for strategy in [CountStrategy::Recompute, CountStrategy::Incremental] {
            let mut engine = engine_from(5, &[(1, 1), (1, 2), (2, 1), (2, 2)], strategy);
            let initial = engine.grid().cells().to_vec();

            for _ in 0..10 {
                let deltas = engine.step();
                assert!(deltas.is_empty());
                assert_eq!(engine.grid().cells(), &initial[..]);
            }
            assert_counts_consistent(&engine);
        }
    }

    #[test]
    fn test_blinker_oscillates() {
        let mut engine = engine_from(
            5,
            &[(2, 1), (2, 2), (2, 3)],
            CountStrategy::Incremental,
        );

        let deltas = engine.step();
        assert_eq!(deltas.len(), 4);
        assert!(engine.get(1, 2));
        assert!(engine.get(2, 2));
        assert!(engine.get(3, 2));
        assert!(!engine.get(2, 1));
        assert!(!engine.get(2, 3));
        assert_counts_consistent(&engine);

        // Period 2: back to the horizontal triplet.
        engine.step();
        assert!(engine.get(2, 1) && engine.get(2, 2) && engine.get(2, 3));
        assert_eq!(engine.generation(), 2);
    }

    #[test]
    fn test_two_block_fixture() {
        // Two 2×2 blocks touching at a corner on a 6×6 torus. The shared
        // corners see 4 neighbors and die; nothing is born.
        #[rustfmt::skip]
        let seed = vec![
            0, 0, 0, 0, 0, 0,
            0, 1, 1, 0, 0, 0,
            0, 1, 1, 0, 0, 0,
            0, 0, 0, 1, 1, 0,
            0, 0, 0, 1, 1, 0,
            0, 0, 0, 0, 0, 0,
        ];
        #[rustfmt::skip]
        let expected = vec![
            0, 0, 0, 0, 0, 0,
            0, 1, 1, 0, 0, 0,
            0, 1, 0, 0, 0, 0,
            0, 0, 0, 0, 1, 0,
            0, 0, 0, 1, 1, 0,
            0, 0, 0, 0, 0, 0,
        ];
        let cells: Vec<bool> = seed.iter().map(|&c| c == 1).collect();

        for strategy in [CountStrategy::Recompute, CountStrategy::Incremental] {
            let mut engine =
                Engine::from_cells(6, cells.clone(), Rule::conway(), strategy).unwrap();
            let deltas = engine.step();

            let result: Vec<u8> = engine.grid().cells().iter().map(|&c| c as u8).collect();
            assert_eq!(result, expected);
            assert_eq!(deltas.len(), 2);
            assert!(deltas.iter().all(|d| !d.alive));
            assert_counts_consistent(&engine);
        }
    }

    #[test]
    fn test_glider_translates() {
        // A glider in open space moves one cell down-right every 4
        // generations.
        let glider = [(1, 2), (2, 3), (3, 1), (3, 2), (3, 3)];
        let mut engine = engine_from(20, &glider, CountStrategy::Incremental);

        engine.steps(4);

        assert_eq!(engine.grid().population(), 5);
        for &(row, col) in &glider {
            assert!(engine.get(row + 1, col + 1), "({row}, {col}) not translated");
        }
        assert_counts_consistent(&engine);
    }

    #[test]
    fn test_counts_stay_consistent_over_random_run() {
        for strategy in [CountStrategy::Recompute, CountStrategy::Incremental] {
            let mut engine =
                Engine::random_seeded(16, 0.35, 99, Rule::conway(), strategy).unwrap();
            for _ in 0..25 {
                engine.step();
                assert_counts_consistent(&engine);
            }
        }
    }

    #[test]
    fn test_set_keeps_counts_in_sync() {
        let mut engine = Engine::random_seeded(10, 0.4, 3, Rule::conway(), CountStrategy::Incremental).unwrap();

        engine.set(4, 4, true);
        engine.set(4, 4, true); // no-op, must not double-count
        engine.set(7, 2, false);
        assert_counts_consistent(&engine);

        engine.step();
        assert_counts_consistent(&engine);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut engine = engine_from(4, &[], CountStrategy::Recompute);
        assert_eq!(engine.set_workers(0), Err(EngineError::ZeroWorkers));
        assert!(engine.set_workers(4).is_ok());
        assert_eq!(engine.workers(), 4);
    }

    #[test]
    fn test_sink_receives_every_flip() {
        let mut engine = engine_from(5, &[(2, 1), (2, 2), (2, 3)], CountStrategy::Incremental);

        let mut seen = Vec::new();
        let deltas = engine.step_with_sink(&mut |delta: CellDelta| seen.push(delta));

        assert_eq!(seen, deltas);
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_offset_rule_matches_conway() {
        let mut a = Engine::random_seeded(12, 0.4, 5, Rule::conway(), CountStrategy::Incremental).unwrap();
        let mut b = Engine::random_seeded(12, 0.4, 5, Rule::offset(2), CountStrategy::Incremental).unwrap();

        a.steps(10);
        b.steps(10);
        assert_eq!(a.grid().cells(), b.grid().cells());
    }

    #[test]
    fn test_custom_rule_applies() {
        // Survival-only rule: nothing is ever born, a lone pair dies.
        let rule = Rule::new(9, [2, 3]);
        let mut engine = Engine::from_cells(
            5,
            {
                let mut cells = vec![false; 25];
                cells[2 * 5 + 1] = true;
                cells[2 * 5 + 2] = true;
                cells
            },
            rule,
            CountStrategy::Incremental,
        )
        .unwrap();

        engine.step();
        assert_eq!(engine.grid().population(), 0);
        assert_counts_consistent(&engine);
    }
}
