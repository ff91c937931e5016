//! Initial solution: station selection, nearest-neighbor cycle and optional
//! 2-opt improvement, evaluated under a [`CostModel`].

use crate::distance::DistanceMatrix;
use crate::error::Result;
use crate::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
use crate::heuristics::local_search::{LocalSearch, TwoOptSearch};
use crate::heuristics::selection::{select_stations, SelectionMethod};
use crate::instance::Instance;
use crate::solution::{CostModel, Solution};

/// Builds the cycle for a fixed station set: nearest neighbor in ascending
/// id order, then 2-opt when `improve` is set.
pub fn route_stations(
    stations: &[usize],
    matrix: &DistanceMatrix,
    improve: bool,
) -> Result<Vec<usize>> {
    let construction = NearestNeighborHeuristic::new();
    let mut cycle = construction.construct(stations, matrix)?;
    if improve {
        let search = TwoOptSearch::first_improvement();
        if search.improve(matrix, &mut cycle)? {
            log::trace!("{} improved the {} cycle", search.name(), construction.name());
        }
    }
    Ok(cycle)
}

/// Constructive method of the comparison
pub trait SolutionBuilder {
    fn build(
        &self,
        instance: &Instance,
        matrix: &DistanceMatrix,
        p: usize,
        selection: SelectionMethod,
        improve: bool,
        cost: &CostModel,
    ) -> Result<Solution>;
    fn name(&self) -> &str;
}

/// Default constructive method: [`select_stations`] then [`route_stations`]
#[derive(Debug, Clone, Copy, Default)]
pub struct InitialSolutionBuilder;

impl SolutionBuilder for InitialSolutionBuilder {
    fn build(
        &self,
        instance: &Instance,
        matrix: &DistanceMatrix,
        p: usize,
        selection: SelectionMethod,
        improve: bool,
        cost: &CostModel,
    ) -> Result<Solution> {
        let stations = select_stations(instance, matrix, p, selection)?;
        log::debug!("{} selection picked {:?}", selection.name(), stations);

        let cycle = route_stations(&stations, matrix, improve)?;
        Solution::evaluate(instance, matrix, cycle, cost)
    }

    fn name(&self) -> &str {
        "InitialSolution"
    }
}
