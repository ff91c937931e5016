//! Station selection: choosing `p` of the `n` points of an instance.

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::instance::Instance;
use ordered_float::OrderedFloat;
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// How the initial station set is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMethod {
    /// Spread stations over a regular grid laid on the bounding box
    Grid,
    /// Uniform random subset, reproducible through a seed
    Random { seed: u64 },
}

impl SelectionMethod {
    pub fn name(&self) -> &str {
        match self {
            SelectionMethod::Grid => "grid",
            SelectionMethod::Random { .. } => "random",
        }
    }
}

/// Select `p` station ids, returned in ascending order.
pub fn select_stations(
    instance: &Instance,
    matrix: &DistanceMatrix,
    p: usize,
    method: SelectionMethod,
) -> Result<Vec<usize>> {
    let n = instance.dimension();
    if p == 0 || p > n {
        return Err(Error::invalid(format!(
            "p must lie in 1..={} for this instance, got {}",
            n, p
        )));
    }

    let mut stations = match method {
        SelectionMethod::Grid => grid_selection(instance, matrix, p)?,
        SelectionMethod::Random { seed } => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            sample(&mut rng, n, p)
                .into_iter()
                .map(|i| instance.points[i].id)
                .collect()
        }
    };

    stations.sort_unstable();
    Ok(stations)
}

/// Grid selection.
///
/// The bounding box is cut into `k×k` cells with `k = ceil(sqrt(p))`. Each
/// non-empty cell nominates the point closest to its centre. When more cells
/// than `p` are populated, the most populated cells are kept; when fewer,
/// the set is completed farthest-first (the point furthest from its nearest
/// station is added until `p` stations are chosen).
fn grid_selection(instance: &Instance, matrix: &DistanceMatrix, p: usize) -> Result<Vec<usize>> {
    let (min_x, max_x, min_y, max_y) = match instance.bounds() {
        Some(b) => b,
        None => return Ok(Vec::new()),
    };

    let k = (p as f64).sqrt().ceil() as usize;
    let width = (max_x - min_x).max(f64::EPSILON) / k as f64;
    let height = (max_y - min_y).max(f64::EPSILON) / k as f64;

    let cell_of = |x: f64, y: f64| -> usize {
        let cx = (((x - min_x) / width) as usize).min(k - 1);
        let cy = (((y - min_y) / height) as usize).min(k - 1);
        cy * k + cx
    };

    // per cell: (population, nominated point id, distance to centre)
    let mut cells: Vec<(usize, Option<(usize, f64)>)> = vec![(0, None); k * k];
    for point in &instance.points {
        let cell = cell_of(point.x, point.y);
        let cx = min_x + (cell % k) as f64 * width + width / 2.0;
        let cy = min_y + (cell / k) as f64 * height + height / 2.0;
        let d = ((point.x - cx).powi(2) + (point.y - cy).powi(2)).sqrt();

        let entry = &mut cells[cell];
        entry.0 += 1;
        if entry.1.map_or(true, |(_, best)| d < best) {
            entry.1 = Some((point.id, d));
        }
    }

    let mut nominated: Vec<(usize, usize)> = cells
        .iter()
        .filter_map(|&(count, best)| best.map(|(id, _)| (count, id)))
        .collect();

    if nominated.len() > p {
        // stable: equally populated cells keep row-major order
        nominated.sort_by(|a, b| b.0.cmp(&a.0));
        nominated.truncate(p);
    }

    let mut stations: Vec<usize> = nominated.into_iter().map(|(_, id)| id).collect();

    while stations.len() < p {
        let mut farthest: Option<(usize, f64)> = None;
        for point in &instance.points {
            if stations.contains(&point.id) {
                continue;
            }
            if let Some((_, d)) = matrix.nearest_among(point.id, &stations)? {
                if farthest.map_or(true, |(_, fd)| OrderedFloat(d) > OrderedFloat(fd)) {
                    farthest = Some((point.id, d));
                }
            }
        }
        match farthest {
            Some((id, _)) => stations.push(id),
            None => break,
        }
    }

    Ok(stations)
}
