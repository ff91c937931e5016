//! Exact solvers module.
//!
//! An exact solver either proves optimality within its time budget, returns
//! the best solution found when the budget runs out, or returns `None` when
//! it found nothing at all. The time limit is enforced by the solver itself.

mod enumeration;

pub use enumeration::*;

use crate::distance::DistanceMatrix;
use crate::error::Result;
use crate::instance::Instance;
use crate::solution::{CostModel, ExactStatus, Solution};
use std::time::Duration;

/// Result of exact solving
#[derive(Debug, Clone, PartialEq)]
pub struct ExactResult {
    /// Best solution found
    pub solution: Solution,
    pub status: ExactStatus,
    /// Proven lower bound on the optimal cost, when one is known
    pub lower_bound: Option<f64>,
    /// Number of station sets examined
    pub nodes_explored: u64,
}

pub trait ExactSolver {
    /// `Ok(None)` means no feasible solution was found within `time_limit`.
    fn solve(
        &self,
        instance: &Instance,
        matrix: &DistanceMatrix,
        p: usize,
        cost: &CostModel,
        time_limit: Duration,
    ) -> Result<Option<ExactResult>>;
    fn name(&self) -> &str;
}
