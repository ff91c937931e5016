//! Solution representation and per-method result records.
//!
//! A [`Solution`] is one evaluated candidate: a station set, the closed
//! cycle through it and its cost components. A [`MethodRecord`] is what the
//! comparison keeps for each method; its [`MethodOutcome`] is tagged by
//! method family so that exact-only data (status, lower bound) never shows
//! up as empty optional fields on heuristic results.

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::heuristics::construction::cycle_length;
use crate::instance::Instance;
use serde::{Deserialize, Serialize};

/// Weighting between tour length and assignment cost.
///
/// `cost_total = alpha * cycle_length + (1 - alpha) * assignment_cost`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub alpha: f64,
}

impl CostModel {
    pub fn new(alpha: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(Error::invalid(format!("alpha must lie in [0, 1], got {}", alpha)));
        }
        Ok(CostModel { alpha })
    }

    #[inline]
    pub fn combine(&self, cycle_length: f64, assignment_cost: f64) -> f64 {
        self.alpha * cycle_length + (1.0 - self.alpha) * assignment_cost
    }
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel { alpha: 0.5 }
    }
}

/// Sum over non-station points of the distance to their nearest station.
pub fn assignment_cost(instance: &Instance, matrix: &DistanceMatrix, stations: &[usize]) -> Result<f64> {
    if stations.is_empty() {
        return Err(Error::invalid("assignment cost needs at least one station"));
    }
    let mut total = 0.0;
    for point in &instance.points {
        if stations.contains(&point.id) {
            continue;
        }
        if let Some((_, d)) = matrix.nearest_among(point.id, stations)? {
            total += d;
        }
    }
    Ok(total)
}

/// An evaluated candidate solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Selected station ids, ascending
    pub stations: Vec<usize>,
    /// Closed cycle through the stations (first == last)
    pub cycle: Vec<usize>,
    pub cycle_length: f64,
    pub assignment_cost: f64,
    /// Weighted objective, see [`CostModel`]
    pub cost_total: f64,
}

impl Solution {
    /// Evaluate a cycle: recompute its length, the assignment cost of its
    /// stations and the weighted total.
    pub fn evaluate(
        instance: &Instance,
        matrix: &DistanceMatrix,
        cycle: Vec<usize>,
        cost: &CostModel,
    ) -> Result<Self> {
        let mut stations: Vec<usize> = if cycle.len() > 1 {
            cycle[..cycle.len() - 1].to_vec()
        } else {
            cycle.clone()
        };
        stations.sort_unstable();

        let cycle_length = cycle_length(&cycle, matrix)?;
        let assignment_cost = assignment_cost(instance, matrix, &stations)?;

        Ok(Solution {
            stations,
            cycle,
            cycle_length,
            assignment_cost,
            cost_total: cost.combine(cycle_length, assignment_cost),
        })
    }

    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  Total cost: {:.2}", self.cost_total)?;
        writeln!(f, "  Cycle length: {:.2}", self.cycle_length)?;
        writeln!(f, "  Assignment cost: {:.2}", self.assignment_cost)?;
        writeln!(f, "  Stations: {:?}", self.stations)?;
        writeln!(f, "  Cycle: {:?}", self.cycle)
    }
}

/// Terminal state reported by an exact solver that produced a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExactStatus {
    /// Search space exhausted, the solution is optimal
    Optimal,
    /// Time limit reached, the solution is the best found so far
    TimeLimit,
}

/// Status label shared by all method families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodStatus {
    Completed,
    Optimal,
    TimeLimit,
    Unsolved,
    InstanceTooLarge,
    Failed,
}

impl std::fmt::Display for MethodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MethodStatus::Completed => "completed",
            MethodStatus::Optimal => "optimal",
            MethodStatus::TimeLimit => "time limit",
            MethodStatus::Unsolved => "unsolved",
            MethodStatus::InstanceTooLarge => "instance too large",
            MethodStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

impl From<ExactStatus> for MethodStatus {
    fn from(status: ExactStatus) -> Self {
        match status {
            ExactStatus::Optimal => MethodStatus::Optimal,
            ExactStatus::TimeLimit => MethodStatus::TimeLimit,
        }
    }
}

/// What a method produced, tagged by method family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MethodOutcome {
    Constructive {
        solution: Solution,
    },
    Metaheuristic {
        solution: Solution,
        iterations: usize,
    },
    Exact {
        solution: Solution,
        status: ExactStatus,
        lower_bound: Option<f64>,
    },
    /// The instance exceeds the exact-solving threshold; no solver call was made
    InstanceTooLarge,
    /// The exact solver found no feasible solution within its time limit
    Unsolved,
    /// The method returned an error
    Failed {
        error: String,
    },
}

impl MethodOutcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            MethodOutcome::Constructive { solution }
            | MethodOutcome::Metaheuristic { solution, .. }
            | MethodOutcome::Exact { solution, .. } => Some(solution),
            _ => None,
        }
    }

    pub fn status(&self) -> MethodStatus {
        match self {
            MethodOutcome::Constructive { .. } | MethodOutcome::Metaheuristic { .. } => {
                MethodStatus::Completed
            }
            MethodOutcome::Exact { status, .. } => (*status).into(),
            MethodOutcome::InstanceTooLarge => MethodStatus::InstanceTooLarge,
            MethodOutcome::Unsolved => MethodStatus::Unsolved,
            MethodOutcome::Failed { .. } => MethodStatus::Failed,
        }
    }
}

/// Result of one method within a comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub name: String,
    /// Wall-clock time; `None` when the method was not invoked
    pub time_seconds: Option<f64>,
    pub outcome: MethodOutcome,
}

impl MethodRecord {
    pub fn new<S: Into<String>>(name: S, time_seconds: Option<f64>, outcome: MethodOutcome) -> Self {
        MethodRecord {
            name: name.into(),
            time_seconds,
            outcome,
        }
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.outcome.solution()
    }

    pub fn cost_total(&self) -> Option<f64> {
        self.solution().map(|s| s.cost_total)
    }

    pub fn cycle_length(&self) -> Option<f64> {
        self.solution().map(|s| s.cycle_length)
    }

    pub fn assignment_cost(&self) -> Option<f64> {
        self.solution().map(|s| s.assignment_cost)
    }

    pub fn stations(&self) -> Option<&[usize]> {
        self.solution().map(|s| s.stations.as_slice())
    }

    pub fn status(&self) -> MethodStatus {
        self.outcome.status()
    }

    pub fn lower_bound(&self) -> Option<f64> {
        match &self.outcome {
            MethodOutcome::Exact { lower_bound, .. } => *lower_bound,
            _ => None,
        }
    }

    pub fn iterations(&self) -> Option<usize> {
        match &self.outcome {
            MethodOutcome::Metaheuristic { iterations, .. } => Some(*iterations),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            MethodOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}
