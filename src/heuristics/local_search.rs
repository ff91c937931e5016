//! Local search improvement of closed cycles.
//!
//! Cycles are `[s0, s1, ..., s0]`: the first and last entries stay fixed and
//! only the interior order changes.

use crate::distance::DistanceMatrix;
use crate::error::Result;

/// Trait for local search improvement methods
pub trait LocalSearch {
    /// Improve `cycle` in place; returns whether it changed.
    fn improve(&self, matrix: &DistanceMatrix, cycle: &mut Vec<usize>) -> Result<bool>;
    fn name(&self) -> &str;
}

/// 2-Opt Local Search
///
/// Reverses segments of the cycle while that shortens it.
///
/// ```text
/// delta = d(c[i], c[j]) + d(c[i+1], c[j+1]) - d(c[i], c[i+1]) - d(c[j], c[j+1])
/// ```
#[derive(Debug, Clone)]
pub struct TwoOptSearch {
    /// Use first improvement instead of best improvement
    pub first_improvement: bool,
    /// Upper bound on improving passes
    pub max_iterations: usize,
}

impl TwoOptSearch {
    pub fn new() -> Self {
        TwoOptSearch {
            first_improvement: false,
            max_iterations: 1000,
        }
    }

    pub fn first_improvement() -> Self {
        TwoOptSearch {
            first_improvement: true,
            max_iterations: 1000,
        }
    }

    fn delta(&self, matrix: &DistanceMatrix, cycle: &[usize], i: usize, j: usize) -> Result<f64> {
        let (a, b) = (cycle[i], cycle[i + 1]);
        let (c, d) = (cycle[j], cycle[j + 1]);
        Ok(matrix.lookup(a, c)? + matrix.lookup(b, d)? - matrix.lookup(a, b)? - matrix.lookup(c, d)?)
    }
}

impl Default for TwoOptSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for TwoOptSearch {
    fn improve(&self, matrix: &DistanceMatrix, cycle: &mut Vec<usize>) -> Result<bool> {
        let n = cycle.len();
        // [a, b, c, a] is the smallest cycle with two non-adjacent edges
        if n < 5 {
            return Ok(false);
        }

        let mut total_improved = false;
        let mut iterations = 0;

        loop {
            if iterations >= self.max_iterations {
                log::debug!("2-opt stopped after {} passes", iterations);
                break;
            }
            iterations += 1;

            let mut best: Option<(usize, usize, f64)> = None;

            'outer: for i in 0..n - 3 {
                for j in i + 2..n - 1 {
                    if i == 0 && j == n - 2 {
                        continue; // edges share the start station
                    }

                    let delta = self.delta(matrix, cycle, i, j)?;
                    if delta < -1e-9 && best.map_or(true, |(_, _, bd)| delta < bd) {
                        best = Some((i, j, delta));
                        if self.first_improvement {
                            break 'outer;
                        }
                    }
                }
            }

            match best {
                Some((i, j, _)) => {
                    cycle[i + 1..=j].reverse();
                    total_improved = true;
                }
                None => break,
            }
        }

        Ok(total_improved)
    }

    fn name(&self) -> &str {
        if self.first_improvement {
            "2-Opt-FI"
        } else {
            "2-Opt-BI"
        }
    }
}
