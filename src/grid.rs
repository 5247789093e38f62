//! Toroidal cell-state storage.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::EngineError;

/// N×N toroidal grid of binary cell states.
///
/// Cells are stored flat in row-major order (`row * n + col`). Row and
/// column arithmetic wraps modulo `n` in both dimensions, so the grid has
/// no edge: row or column `n` is row or column 0, and a live cell at (0, 0)
/// neighbors cells on the opposite sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Side length N.
    n: usize,
    /// Cell states, `true` = alive.
    cells: Vec<bool>,
}

impl Grid {
    /// Creates a grid from an explicit seed of exactly `n * n` cells.
    pub fn from_cells(n: usize, cells: Vec<bool>) -> Result<Self, EngineError> {
        if n == 0 {
            return Err(EngineError::ZeroDimension);
        }
        if cells.len() != n * n {
            return Err(EngineError::SeedLength {
                expected: n * n,
                got: cells.len(),
            });
        }
        Ok(Self { n, cells })
    }

    /// Creates a grid with each cell independently alive with probability
    /// `alive_probability`, drawn from a fresh entropy-seeded source.
    pub fn random(n: usize, alive_probability: f64) -> Result<Self, EngineError> {
        Self::random_with(n, alive_probability, &mut rand::rng())
    }

    /// Like [`Grid::random`], but fully deterministic for a given seed.
    pub fn random_seeded(n: usize, alive_probability: f64, seed: u64) -> Result<Self, EngineError> {
        Self::random_with(n, alive_probability, &mut StdRng::seed_from_u64(seed))
    }

    fn random_with<R: Rng>(n: usize, alive_probability: f64, rng: &mut R) -> Result<Self, EngineError> {
        if n == 0 {
            return Err(EngineError::ZeroDimension);
        }
        if !(0.0..=1.0).contains(&alive_probability) {
            return Err(EngineError::InvalidProbability(alive_probability));
        }
        let cells = (0..n * n).map(|_| rng.random_bool(alive_probability)).collect();
        Ok(Self { n, cells })
    }

    /// Returns the side length N.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Gets the state of a cell; row and col wrap modulo N.
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[self.index(row, col)]
    }

    /// Sets the state of a cell; row and col wrap modulo N.
    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        let idx = self.index(row, col);
        self.cells[idx] = alive;
    }

    /// Returns the flat cell buffer in row-major order.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Counts alive cells.
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Converts the grid to a string representation, one row per line.
    pub fn to_string_art(&self) -> String {
        let mut result = String::new();
        for row in self.cells.chunks(self.n) {
            for &cell in row {
                result.push(if cell { '█' } else { ' ' });
            }
            result.push('\n');
        }
        result
    }

    /// Flat index of a (possibly out-of-range) cell position.
    fn index(&self, row: usize, col: usize) -> usize {
        (row % self.n) * self.n + col % self.n
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<bool> {
        &mut self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cells() {
        let grid = Grid::from_cells(3, vec![false; 9]).unwrap();
        assert_eq!(grid.size(), 3);
        assert_eq!(grid.population(), 0);
    }

    #[test]
    fn test_from_cells_length_mismatch() {
        let err = Grid::from_cells(3, vec![false; 8]).unwrap_err();
        assert_eq!(err, EngineError::SeedLength { expected: 9, got: 8 });
    }

    #[test]
    fn test_zero_dimension() {
        assert_eq!(
            Grid::from_cells(0, Vec::new()).unwrap_err(),
            EngineError::ZeroDimension
        );
        assert_eq!(
            Grid::random_seeded(0, 0.5, 1).unwrap_err(),
            EngineError::ZeroDimension
        );
    }

    #[test]
    fn test_invalid_probability() {
        let err = Grid::random_seeded(4, 1.5, 1).unwrap_err();
        assert_eq!(err, EngineError::InvalidProbability(1.5));
        assert!(Grid::random_seeded(4, -0.1, 1).is_err());
    }

    #[test]
    fn test_set_get_wraps() {
        let mut grid = Grid::from_cells(5, vec![false; 25]).unwrap();

        // Row 5 wraps to row 0, col 7 wraps to col 2.
        grid.set(5, 7, true);
        assert!(grid.get(0, 2));
        assert!(grid.get(5, 2));
        assert!(grid.get(10, 12));
    }

    #[test]
    fn test_random_seeded_deterministic() {
        let a = Grid::random_seeded(16, 0.4, 42).unwrap();
        let b = Grid::random_seeded(16, 0.4, 42).unwrap();
        assert_eq!(a, b);

        let c = Grid::random_seeded(16, 0.4, 43).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_random_density() {
        let grid = Grid::random_seeded(20, 0.5, 12345).unwrap();
        let pop = grid.population();
        // Roughly 50% alive, with some variance.
        assert!(pop > 100 && pop < 300);

        assert_eq!(Grid::random_seeded(20, 0.0, 1).unwrap().population(), 0);
        assert_eq!(Grid::random_seeded(20, 1.0, 1).unwrap().population(), 400);
    }

    #[test]
    fn test_to_string_art() {
        let mut grid = Grid::from_cells(3, vec![false; 9]).unwrap();
        grid.set(1, 1, true);
        let art = grid.to_string_art();

        let lines: Vec<_> = art.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].chars().nth(1), Some('█'));
    }
}
