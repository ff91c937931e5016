//! Exhaustive exact solver.
//!
//! Every `p`-subset of the points is enumerated in lexicographic order. For
//! each subset the assignment cost is computed first; subsets whose weighted
//! assignment cost alone already reaches the incumbent are skipped. The
//! remaining ones get an optimal cycle from the Held-Karp dynamic program
//! (`O(2^p * p^2)`).

use super::{ExactResult, ExactSolver};
use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::solution::{CostModel, ExactStatus, Solution};
use std::time::{Duration, Instant};

/// Largest station count accepted by the Held-Karp table
const MAX_STATIONS: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct EnumerationSolver;

impl EnumerationSolver {
    pub fn new() -> Self {
        EnumerationSolver
    }
}

/// Optimal closed cycle over matrix positions `nodes`, as `(length, order)`.
/// The order starts at `nodes[0]` and does not repeat it.
fn held_karp(matrix: &DistanceMatrix, nodes: &[usize]) -> (f64, Vec<usize>) {
    let k = nodes.len();
    if k <= 1 {
        return (0.0, nodes.to_vec());
    }

    let full = (1usize << k) - 1;
    let mut dp = vec![f64::INFINITY; (full + 1) * k];
    let mut parent = vec![usize::MAX; (full + 1) * k];
    // mask {start}, ending at the start
    dp[k] = 0.0;

    for mask in 1..=full {
        if mask & 1 == 0 {
            continue;
        }
        for last in 0..k {
            if mask & (1 << last) == 0 {
                continue;
            }
            let base = dp[mask * k + last];
            if !base.is_finite() {
                continue;
            }
            for next in 1..k {
                if mask & (1 << next) != 0 {
                    continue;
                }
                let to = mask | (1 << next);
                let value = base + matrix.get(nodes[last], nodes[next]);
                if value < dp[to * k + next] {
                    dp[to * k + next] = value;
                    parent[to * k + next] = last;
                }
            }
        }
    }

    let mut best_last = 1;
    let mut best = f64::INFINITY;
    for last in 1..k {
        let value = dp[full * k + last] + matrix.get(nodes[last], nodes[0]);
        if value < best {
            best = value;
            best_last = last;
        }
    }

    let mut order = Vec::with_capacity(k);
    let mut mask = full;
    let mut current = best_last;
    while current != 0 {
        order.push(nodes[current]);
        let prev = parent[mask * k + current];
        mask &= !(1 << current);
        current = prev;
    }
    order.push(nodes[0]);
    order.reverse();

    (best, order)
}

/// Advance `comb` to the next `p`-combination of `0..n`; `false` when done.
fn next_combination(comb: &mut [usize], n: usize) -> bool {
    let p = comb.len();
    let mut i = p;
    while i > 0 {
        i -= 1;
        if comb[i] < n - p + i {
            comb[i] += 1;
            for j in i + 1..p {
                comb[j] = comb[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

impl ExactSolver for EnumerationSolver {
    fn solve(
        &self,
        instance: &Instance,
        matrix: &DistanceMatrix,
        p: usize,
        cost: &CostModel,
        time_limit: Duration,
    ) -> Result<Option<ExactResult>> {
        let start = Instant::now();
        let n = matrix.len();
        if p == 0 || p > n {
            return Err(Error::invalid(format!("p must lie in 1..={}, got {}", n, p)));
        }
        if p > MAX_STATIONS {
            return Err(Error::invalid(format!(
                "exact enumeration supports at most {} stations",
                MAX_STATIONS
            )));
        }

        let mut comb: Vec<usize> = (0..p).collect();
        let mut in_set = vec![false; n];
        let mut incumbent: Option<(f64, Vec<usize>)> = None;
        let mut explored: u64 = 0;
        let mut exhausted = false;

        loop {
            if start.elapsed() >= time_limit {
                log::warn!("exact enumeration hit the time limit after {} subsets", explored);
                break;
            }
            explored += 1;

            for &i in &comb {
                in_set[i] = true;
            }
            let mut assignment = 0.0;
            for point in 0..n {
                if in_set[point] {
                    continue;
                }
                let nearest = comb
                    .iter()
                    .map(|&s| matrix.get(point, s))
                    .fold(f64::INFINITY, f64::min);
                assignment += nearest;
            }
            for &i in &comb {
                in_set[i] = false;
            }

            let bound = cost.combine(0.0, assignment);
            let promising = incumbent.as_ref().map_or(true, |(best, _)| bound < *best);
            if promising {
                let (length, order) = held_karp(matrix, &comb);
                let total = cost.combine(length, assignment);
                if incumbent.as_ref().map_or(true, |(best, _)| total < *best) {
                    incumbent = Some((total, order));
                }
            }

            if !next_combination(&mut comb, n) {
                exhausted = true;
                break;
            }
        }

        let (_, order) = match incumbent {
            Some(found) => found,
            None => return Ok(None),
        };

        let mut cycle: Vec<usize> = order.iter().map(|&i| matrix.id_at(i)).collect();
        cycle.push(cycle[0]);
        let solution = Solution::evaluate(instance, matrix, cycle, cost)?;

        let status = if exhausted {
            ExactStatus::Optimal
        } else {
            ExactStatus::TimeLimit
        };
        let lower_bound = if exhausted {
            Some(solution.cost_total)
        } else {
            None
        };

        log::debug!(
            "exact enumeration: {} subsets in {:.3}s, cost {:.2}",
            explored,
            start.elapsed().as_secs_f64(),
            solution.cost_total
        );

        Ok(Some(ExactResult {
            solution,
            status,
            lower_bound,
            nodes_explored: explored,
        }))
    }

    fn name(&self) -> &str {
        "Enumeration"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::initial::{InitialSolutionBuilder, SolutionBuilder};
    use crate::heuristics::selection::SelectionMethod;
    use crate::instance::Point;

    fn instance() -> Instance {
        let coords = [
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 3.0),
            (0.0, 3.0),
            (2.0, 1.5),
            (6.0, 1.0),
            (1.0, 5.0),
        ];
        Instance::new(
            "small",
            coords
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| Point::new(i + 1, x, y))
                .collect(),
        )
    }

    fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_held_karp_matches_brute_force() {
        let instance = instance();
        let dm = DistanceMatrix::build(&instance.points).unwrap();
        let nodes: Vec<usize> = (0..dm.len()).collect();

        let (length, order) = held_karp(&dm, &nodes);

        let mut brute = f64::INFINITY;
        for perm in permutations(&nodes[1..]) {
            let mut tour = vec![0];
            tour.extend(perm);
            tour.push(0);
            let len: f64 = tour.windows(2).map(|w| dm.get(w[0], w[1])).sum();
            brute = brute.min(len);
        }

        assert!((length - brute).abs() < 1e-9);
        assert_eq!(order.len(), nodes.len());
        assert_eq!(order[0], 0);
        let reconstructed: f64 = order
            .windows(2)
            .map(|w| dm.get(w[0], w[1]))
            .sum::<f64>()
            + dm.get(order[order.len() - 1], order[0]);
        assert!((reconstructed - length).abs() < 1e-9);
    }

    #[test]
    fn test_next_combination() {
        let mut comb = vec![0, 1];
        let mut seen = vec![comb.clone()];
        while next_combination(&mut comb, 4) {
            seen.push(comb.clone());
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen.last().unwrap(), &vec![2, 3]);
    }

    #[test]
    fn test_optimal_not_beaten_by_heuristic() {
        let instance = instance();
        let dm = DistanceMatrix::build(&instance.points).unwrap();
        let cost = CostModel::new(0.5).unwrap();

        let result = EnumerationSolver::new()
            .solve(&instance, &dm, 3, &cost, Duration::from_secs(60))
            .unwrap()
            .unwrap();

        assert_eq!(result.status, ExactStatus::Optimal);
        assert_eq!(result.lower_bound, Some(result.solution.cost_total));
        assert_eq!(result.nodes_explored, 35);
        assert_eq!(result.solution.num_stations(), 3);
        assert_eq!(result.solution.cycle.first(), result.solution.cycle.last());

        let heuristic = InitialSolutionBuilder
            .build(&instance, &dm, 3, SelectionMethod::Grid, true, &cost)
            .unwrap();
        assert!(result.solution.cost_total <= heuristic.cost_total + 1e-9);
    }

    #[test]
    fn test_single_station() {
        let instance = instance();
        let dm = DistanceMatrix::build(&instance.points).unwrap();
        let cost = CostModel::new(0.5).unwrap();

        let result = EnumerationSolver::new()
            .solve(&instance, &dm, 1, &cost, Duration::from_secs(60))
            .unwrap()
            .unwrap();

        assert_eq!(result.solution.cycle.len(), 2);
        assert_eq!(result.solution.cycle_length, 0.0);
    }

    #[test]
    fn test_zero_time_limit_finds_nothing() {
        let instance = instance();
        let dm = DistanceMatrix::build(&instance.points).unwrap();
        let cost = CostModel::default();

        let result = EnumerationSolver::new()
            .solve(&instance, &dm, 3, &cost, Duration::ZERO)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_p() {
        let instance = instance();
        let dm = DistanceMatrix::build(&instance.points).unwrap();
        let cost = CostModel::default();
        assert!(EnumerationSolver::new()
            .solve(&instance, &dm, 0, &cost, Duration::from_secs(1))
            .is_err());
        assert!(EnumerationSolver::new()
            .solve(&instance, &dm, 8, &cost, Duration::from_secs(1))
            .is_err());
    }
}
