//! Simulated annealing over station sets.
//!
//! A move swaps one selected station for one non-selected point; the cycle
//! of the new set is rebuilt with nearest neighbor and 2-opt, and the move
//! is accepted with the Metropolis rule on `cost_total`.

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::heuristics::initial::route_stations;
use crate::instance::Instance;
use crate::solution::{CostModel, Solution};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Geometric cooling schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoolingSchedule {
    pub initial_temp: f64,
    pub final_temp: f64,
    /// Multiplier applied after each temperature level, in `(0, 1)`
    pub cooling_rate: f64,
    pub iterations_per_temp: usize,
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule {
            initial_temp: 1000.0,
            final_temp: 0.1,
            cooling_rate: 0.95,
            iterations_per_temp: 10,
        }
    }
}

impl CoolingSchedule {
    pub fn validate(&self) -> Result<()> {
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(Error::invalid(format!(
                "cooling rate must lie in (0, 1), got {}",
                self.cooling_rate
            )));
        }
        if self.final_temp <= 0.0 {
            return Err(Error::invalid("final temperature must be positive"));
        }
        Ok(())
    }
}

/// Metaheuristic improvement of a seed solution
pub trait Metaheuristic {
    /// Returns the best solution found and the number of moves evaluated.
    fn run(
        &self,
        instance: &Instance,
        seed: &Solution,
        matrix: &DistanceMatrix,
        cost: &CostModel,
    ) -> Result<(Solution, usize)>;
    fn name(&self) -> &str;
}

/// Simulated Annealing
///
/// Accepts worse station sets with probability `exp(-delta / T)`.
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    pub schedule: CoolingSchedule,
    /// Random seed
    pub seed: u64,
}

impl SimulatedAnnealing {
    pub fn new() -> Self {
        SimulatedAnnealing {
            schedule: CoolingSchedule::default(),
            seed: 42,
        }
    }

    pub fn with_schedule(schedule: CoolingSchedule, seed: u64) -> Self {
        SimulatedAnnealing { schedule, seed }
    }

    /// Swap a random station with a random non-station point.
    ///
    /// Returns the new set, the id that left it and the position in
    /// `outside` of the id that entered.
    fn neighbor(&self, stations: &[usize], outside: &[usize], rng: &mut ChaCha8Rng) -> (Vec<usize>, usize, usize) {
        let out_pos = rng.gen_range(0..stations.len());
        let in_pos = rng.gen_range(0..outside.len());

        let mut next = stations.to_vec();
        let removed = next[out_pos];
        next[out_pos] = outside[in_pos];
        next.sort_unstable();
        (next, removed, in_pos)
    }
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self::new()
    }
}

impl Metaheuristic for SimulatedAnnealing {
    fn run(
        &self,
        instance: &Instance,
        seed: &Solution,
        matrix: &DistanceMatrix,
        cost: &CostModel,
    ) -> Result<(Solution, usize)> {
        self.schedule.validate()?;

        let mut current = seed.clone();
        let mut outside: Vec<usize> = instance
            .ids()
            .into_iter()
            .filter(|id| !current.stations.contains(id))
            .collect();

        if current.stations.is_empty() || outside.is_empty() {
            log::debug!("no station swap possible, keeping the seed solution");
            return Ok((current, 0));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut best = current.clone();
        let mut temp = self.schedule.initial_temp;
        let mut iterations = 0;

        while temp > self.schedule.final_temp {
            for _ in 0..self.schedule.iterations_per_temp {
                let (stations, removed, in_pos) = self.neighbor(&current.stations, &outside, &mut rng);
                let cycle = route_stations(&stations, matrix, true)?;
                let candidate = Solution::evaluate(instance, matrix, cycle, cost)?;
                let delta = candidate.cost_total - current.cost_total;

                let accept = if delta < 0.0 {
                    true
                } else {
                    rng.gen::<f64>() < (-delta / temp).exp()
                };

                if accept {
                    outside[in_pos] = removed;
                    current = candidate;

                    if current.cost_total < best.cost_total {
                        best = current.clone();
                    }
                }

                iterations += 1;
            }

            temp *= self.schedule.cooling_rate;
        }

        log::debug!(
            "annealing: {} moves, best {:.2} (seed {:.2})",
            iterations,
            best.cost_total,
            seed.cost_total
        );

        Ok((best, iterations))
    }

    fn name(&self) -> &str {
        "SimulatedAnnealing"
    }
}
