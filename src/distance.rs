//! Dense Euclidean distance table.
//!
//! Distances are stored row-major by position; point ids are translated to
//! positions at the boundary. The table is built once per point set and is
//! read-only afterwards, so it can be shared by reference across methods.

use crate::error::{Error, Result};
use crate::instance::Point;
use std::collections::HashMap;

/// A dense n×n distance matrix with an id→index lookup.
///
/// # Examples
///
/// ```
/// use station_tour::instance::Point;
/// use station_tour::distance::DistanceMatrix;
///
/// let points = vec![Point::new(1, 0.0, 0.0), Point::new(7, 3.0, 4.0)];
/// let dm = DistanceMatrix::build(&points).unwrap();
/// assert!((dm.lookup(1, 7).unwrap() - 5.0).abs() < 1e-10);
/// assert!(dm.lookup(1, 2).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    ids: Vec<usize>,
    index: HashMap<usize, usize>,
}

impl DistanceMatrix {
    /// Computes all pairwise distances of `points`.
    ///
    /// Fails with [`Error::InvalidInput`] when two points share an id. The
    /// result is symmetric with a zero diagonal.
    pub fn build(points: &[Point]) -> Result<Self> {
        let n = points.len();
        let mut index = HashMap::with_capacity(n);
        for (i, p) in points.iter().enumerate() {
            if index.insert(p.id, i).is_some() {
                return Err(Error::invalid(format!("duplicate point id {}", p.id)));
            }
        }

        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = points[i].distance_to(&points[j]);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }

        let matrix = DistanceMatrix {
            data,
            ids: points.iter().map(|p| p.id).collect(),
            index,
        };
        debug_assert!(matrix.is_symmetric(0.0));
        debug_assert!((0..n).all(|i| matrix.get(i, i) == 0.0));
        Ok(matrix)
    }

    /// Distance between two point ids.
    #[inline]
    pub fn lookup(&self, from: usize, to: usize) -> Result<f64> {
        let i = self.index_of(from)?;
        let j = self.index_of(to)?;
        Ok(self.get(i, j))
    }

    /// Distance between two positions.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.ids.len() + j]
    }

    /// Position of a point id.
    #[inline]
    pub fn index_of(&self, id: usize) -> Result<usize> {
        self.index.get(&id).copied().ok_or(Error::KeyNotFound(id))
    }

    /// Point id stored at a position.
    #[inline]
    pub fn id_at(&self, index: usize) -> usize {
        self.ids[index]
    }

    pub fn contains(&self, id: usize) -> bool {
        self.index.contains_key(&id)
    }

    /// Ids in construction order.
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns `true` if the matrix is symmetric within the given tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let n = self.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if (self.get(i, j) - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Closest candidate to `from` with its distance. The first candidate
    /// wins on ties; `None` when `candidates` is empty.
    pub fn nearest_among(&self, from: usize, candidates: &[usize]) -> Result<Option<(usize, f64)>> {
        let mut best: Option<(usize, f64)> = None;
        for &c in candidates {
            let d = self.lookup(from, c)?;
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((c, d));
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_points() -> Vec<Point> {
        vec![
            Point::new(1, 0.0, 0.0),
            Point::new(2, 3.0, 0.0),
            Point::new(3, 0.0, 4.0),
        ]
    }

    #[test]
    fn test_lookup_by_id() {
        let dm = DistanceMatrix::build(&sample_points()).unwrap();
        assert_eq!(dm.len(), 3);
        assert!((dm.lookup(1, 2).unwrap() - 3.0).abs() < 1e-10);
        assert!((dm.lookup(1, 3).unwrap() - 4.0).abs() < 1e-10);
        assert!((dm.lookup(2, 3).unwrap() - 5.0).abs() < 1e-10);
        assert_eq!(dm.lookup(2, 2).unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_id() {
        let dm = DistanceMatrix::build(&sample_points()).unwrap();
        assert!(matches!(dm.lookup(1, 42), Err(Error::KeyNotFound(42))));
        assert!(matches!(dm.lookup(0, 1), Err(Error::KeyNotFound(0))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let points = vec![Point::new(1, 0.0, 0.0), Point::new(1, 1.0, 1.0)];
        assert!(matches!(
            DistanceMatrix::build(&points),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty() {
        let dm = DistanceMatrix::build(&[]).unwrap();
        assert!(dm.is_empty());
    }

    #[test]
    fn test_nearest_among_first_wins() {
        let points = vec![
            Point::new(1, 0.0, 0.0),
            Point::new(2, 1.0, 0.0),
            Point::new(3, -1.0, 0.0),
            Point::new(4, 5.0, 0.0),
        ];
        let dm = DistanceMatrix::build(&points).unwrap();
        assert_eq!(dm.nearest_among(1, &[4, 3, 2]).unwrap(), Some((3, 1.0)));
        assert_eq!(dm.nearest_among(1, &[]).unwrap(), None);
    }

    fn point_set() -> impl Strategy<Value = Vec<Point>> {
        prop::collection::vec((-1000.0..1000.0f64, -1000.0..1000.0f64), 1..25).prop_map(|coords| {
            coords
                .into_iter()
                .enumerate()
                .map(|(i, (x, y))| Point::new(i + 1, x, y))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_symmetric_zero_diagonal(points in point_set()) {
            let dm = DistanceMatrix::build(&points).unwrap();
            for a in &points {
                prop_assert_eq!(dm.lookup(a.id, a.id).unwrap(), 0.0);
                for b in &points {
                    prop_assert_eq!(dm.lookup(a.id, b.id).unwrap(), dm.lookup(b.id, a.id).unwrap());
                    prop_assert!(dm.lookup(a.id, b.id).unwrap() >= 0.0);
                }
            }
        }

        #[test]
        fn prop_triangle_inequality(points in point_set()) {
            let dm = DistanceMatrix::build(&points).unwrap();
            let n = dm.len();
            for a in 0..n {
                for b in 0..n {
                    for c in 0..n {
                        prop_assert!(dm.get(a, c) <= dm.get(a, b) + dm.get(b, c) + 1e-9);
                    }
                }
            }
        }
    }
}
