//! Birth/survival transition rules.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Two-state Moore-neighborhood transition rule.
///
/// A dead cell becomes alive iff its live-neighbor count equals `birth`; an
/// alive cell stays alive iff its count equals either entry of `survival`.
/// The rule is a pure function of (state, pre-step count) and carries no
/// other state, so the same machinery expresses automata beyond Conway's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rule {
    /// Exact neighbor count that brings a dead cell to life.
    pub birth: u8,
    /// Neighbor counts at which an alive cell stays alive.
    pub survival: [u8; 2],
}

impl Rule {
    /// Creates a rule with the given thresholds.
    pub const fn new(birth: u8, survival: [u8; 2]) -> Self {
        Self { birth, survival }
    }

    /// Conway's Game of Life: birth at 3, survival at 2 or 3.
    pub const fn conway() -> Self {
        Self::new(3, [2, 3])
    }

    /// Rule family parameterized by a single offset `k`: birth at `k + 1`,
    /// survival at `k` or `k + 1`. `offset(2)` is the Conway rule.
    pub const fn offset(k: u8) -> Self {
        Self::new(k + 1, [k, k + 1])
    }

    /// Next state for a cell given its current state and its pre-step
    /// live-neighbor count.
    pub fn next_state(&self, alive: bool, neighbors: u8) -> bool {
        if alive {
            neighbors == self.survival[0] || neighbors == self.survival[1]
        } else {
            neighbors == self.birth
        }
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::conway()
    }
}
