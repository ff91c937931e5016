//! Tour construction over a fixed station set.

use crate::distance::DistanceMatrix;
use crate::error::Result;

/// Builds a closed cycle through a given set of stations
pub trait ConstructionHeuristic {
    fn construct(&self, stations: &[usize], matrix: &DistanceMatrix) -> Result<Vec<usize>>;
    fn name(&self) -> &str;
}

/// Station the nearest-neighbor tour starts from: id `1` when present,
/// otherwise the first station in caller order.
const PREFERRED_START: usize = 1;

/// Nearest Neighbor Heuristic
///
/// Starts at the preferred station and repeatedly moves to the closest
/// unvisited station, then returns to the start.
///
/// Candidates are scanned in the order the caller supplies them and only a
/// strictly smaller distance replaces the current choice, so the first
/// station reaching the minimum wins ties. The result therefore depends on
/// the input order, not on station ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborHeuristic;

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic
    }

    fn find_nearest(
        &self,
        matrix: &DistanceMatrix,
        current: usize,
        stations: &[usize],
        visited: &[bool],
    ) -> Result<Option<usize>> {
        let mut best = None;
        let mut best_distance = f64::INFINITY;

        for (pos, &station) in stations.iter().enumerate() {
            if visited[pos] {
                continue;
            }
            let d = matrix.lookup(current, station)?;
            if d < best_distance {
                best_distance = d;
                best = Some(pos);
            }
        }

        Ok(best)
    }
}

impl ConstructionHeuristic for NearestNeighborHeuristic {
    fn construct(&self, stations: &[usize], matrix: &DistanceMatrix) -> Result<Vec<usize>> {
        if stations.is_empty() {
            return Ok(Vec::new());
        }

        let start_pos = stations
            .iter()
            .position(|&s| s == PREFERRED_START)
            .unwrap_or(0);
        let start = stations[start_pos];
        // Fails early on an unknown start station, even for a single-station input.
        matrix.index_of(start)?;

        let mut cycle = Vec::with_capacity(stations.len() + 1);
        let mut visited = vec![false; stations.len()];
        cycle.push(start);
        visited[start_pos] = true;

        let mut current = start;
        let mut remaining = stations.len() - 1;

        while remaining > 0 {
            match self.find_nearest(matrix, current, stations, &visited)? {
                Some(pos) => {
                    visited[pos] = true;
                    current = stations[pos];
                    cycle.push(current);
                    remaining -= 1;
                }
                None => break,
            }
        }

        cycle.push(start);
        Ok(cycle)
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}

/// Total length of a cycle: the sum of distances between consecutive
/// entries. Cycles with at most one element have length `0.0`.
pub fn cycle_length(cycle: &[usize], matrix: &DistanceMatrix) -> Result<f64> {
    if cycle.len() <= 1 {
        return Ok(0.0);
    }

    let mut length = 0.0;
    for pair in cycle.windows(2) {
        length += matrix.lookup(pair[0], pair[1])?;
    }
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::instance::Point;
    use proptest::prelude::*;

    fn triangle() -> DistanceMatrix {
        DistanceMatrix::build(&[
            Point::new(1, 0.0, 0.0),
            Point::new(2, 3.0, 0.0),
            Point::new(3, 0.0, 4.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_nearest_neighbor_triangle() {
        let dm = triangle();
        let nn = NearestNeighborHeuristic::new();
        let cycle = nn.construct(&[1, 2, 3], &dm).unwrap();
        assert_eq!(cycle, vec![1, 2, 3, 1]);
        assert!((cycle_length(&cycle, &dm).unwrap() - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_starts_at_one_when_present() {
        let dm = triangle();
        let cycle = NearestNeighborHeuristic::new().construct(&[3, 2, 1], &dm).unwrap();
        assert_eq!(cycle[0], 1);
        assert_eq!(*cycle.last().unwrap(), 1);
    }

    #[test]
    fn test_starts_at_first_without_one() {
        let dm = triangle();
        let cycle = NearestNeighborHeuristic::new().construct(&[3, 2], &dm).unwrap();
        assert_eq!(cycle, vec![3, 2, 3]);
    }

    #[test]
    fn test_ties_follow_input_order() {
        // 2 and 3 are both at distance 1 from 1
        let dm = DistanceMatrix::build(&[
            Point::new(1, 0.0, 0.0),
            Point::new(2, 1.0, 0.0),
            Point::new(3, -1.0, 0.0),
        ])
        .unwrap();
        let nn = NearestNeighborHeuristic::new();
        assert_eq!(nn.construct(&[1, 2, 3], &dm).unwrap(), vec![1, 2, 3, 1]);
        assert_eq!(nn.construct(&[1, 3, 2], &dm).unwrap(), vec![1, 3, 2, 1]);
    }

    #[test]
    fn test_degenerate_inputs() {
        let dm = triangle();
        let nn = NearestNeighborHeuristic::new();
        assert!(nn.construct(&[], &dm).unwrap().is_empty());
        assert_eq!(nn.construct(&[2], &dm).unwrap(), vec![2, 2]);
        assert_eq!(cycle_length(&[2, 2], &dm).unwrap(), 0.0);
        assert_eq!(cycle_length(&[2], &dm).unwrap(), 0.0);
        assert_eq!(cycle_length(&[], &dm).unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_station() {
        let dm = triangle();
        let nn = NearestNeighborHeuristic::new();
        assert!(matches!(nn.construct(&[1, 9], &dm), Err(Error::KeyNotFound(9))));
        assert!(matches!(nn.construct(&[9], &dm), Err(Error::KeyNotFound(9))));
    }

    proptest! {
        #[test]
        fn prop_cycle_visits_each_station_once(
            coords in prop::collection::vec((-100.0..100.0f64, -100.0..100.0f64), 1..30)
        ) {
            let points: Vec<Point> = coords
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| Point::new(i + 1, x, y))
                .collect();
            let dm = DistanceMatrix::build(&points).unwrap();
            let stations: Vec<usize> = points.iter().map(|p| p.id).rev().collect();
            let nn = NearestNeighborHeuristic::new();

            let cycle = nn.construct(&stations, &dm).unwrap();
            prop_assert_eq!(cycle.len(), stations.len() + 1);
            prop_assert_eq!(cycle.first(), cycle.last());
            let mut inner = cycle[..cycle.len() - 1].to_vec();
            inner.sort_unstable();
            let mut expected = stations.clone();
            expected.sort_unstable();
            prop_assert_eq!(inner, expected);

            // deterministic
            prop_assert_eq!(nn.construct(&stations, &dm).unwrap(), cycle);
        }
    }
}
