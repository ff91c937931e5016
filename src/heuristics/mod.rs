//! Heuristics module.
//!
//! This module exports station selection, tour construction, local search
//! and the simulated annealing metaheuristic.

pub mod construction;
pub mod selection;
pub mod local_search;
pub mod initial;
pub mod annealing;

pub use construction::*;
pub use selection::*;
pub use local_search::*;
pub use initial::*;
pub use annealing::*;
