//! Toroidal binary cellular-automaton evolution engine.
//!
//! Advances an N×N wrap-around grid of two-state cells one generation at a
//! time. Per-cell live-neighbor counts are kept either by on-demand
//! recomputation or by incremental ±1 bookkeeping around each flipped cell,
//! and a step runs on the caller's thread or fans out over a fixed set of
//! row-band worker threads. Transition decisions always read the previous
//! generation's committed snapshot, so sequential and parallel stepping are
//! bit-identical.
//!
//! # Example
//!
//! ```
//! use torus_life::{CountStrategy, Engine, Rule};
//!
//! // A blinker on a 5×5 torus.
//! let mut cells = vec![false; 25];
//! for col in 1..4 {
//!     cells[2 * 5 + col] = true;
//! }
//! let mut engine =
//!     Engine::from_cells(5, cells, Rule::conway(), CountStrategy::Incremental).unwrap();
//!
//! // One step: the triplet turns vertical; four cells flipped.
//! let flipped = engine.step();
//! assert_eq!(flipped.len(), 4);
//! assert!(engine.grid().get(1, 2));
//! ```

pub mod counts;
pub mod engine;
pub mod error;
pub mod grid;
pub mod rule;

pub use counts::{live_neighbors, CountStrategy, NeighborCounts};
pub use engine::{CellDelta, Engine, RenderSink};
pub use error::EngineError;
pub use grid::Grid;
pub use rule::Rule;
