//! Module for parsing and representing point-set instances.
//!
//! This module handles TSP-LIB style files: a header of `KEY : value` lines
//! followed by a `NODE_COORD_SECTION` with one `id x y` triple per line.
//! Point ids are kept exactly as written in the file.

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A point of the instance, candidate for becoming a station
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Identifier as given by the point source
    pub id: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Point { id, x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A named point set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Points in file order
    pub points: Vec<Point>,
}

#[derive(PartialEq)]
enum Section {
    Header,
    Coords,
    Other,
}

impl Instance {
    pub fn new<S: Into<String>>(name: S, points: Vec<Point>) -> Self {
        Instance {
            name: name.into(),
            comment: String::new(),
            points,
        }
    }

    /// Parse an instance from a TSP-LIB format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::from_reader(BufReader::new(file), &fallback)
    }

    /// Parse an instance from any buffered reader. `fallback_name` is used
    /// when the file carries no `NAME` entry.
    pub fn from_reader<R: BufRead>(reader: R, fallback_name: &str) -> Result<Self> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension: Option<usize> = None;
        let mut points = Vec::new();
        let mut section = Section::Header;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }

            if line.starts_with("NODE_COORD_SECTION") {
                section = Section::Coords;
                continue;
            }
            if line.ends_with("_SECTION") {
                section = Section::Other;
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "NAME" => name = value.to_string(),
                    "COMMENT" => comment = value.to_string(),
                    "DIMENSION" => {
                        dimension = Some(value.parse().map_err(|_| Error::Parse {
                            line: line_no,
                            message: format!("invalid dimension '{}'", value),
                        })?);
                    }
                    "EDGE_WEIGHT_TYPE" => {
                        if value != "EUC_2D" {
                            log::warn!("edge weight type {} treated as EUC_2D", value);
                        }
                    }
                    _ => {}
                }
                section = Section::Header;
                continue;
            }

            if section != Section::Coords {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return Err(Error::Parse {
                    line: line_no,
                    message: format!("expected 'id x y', got '{}'", line),
                });
            }
            let parse_err = |what: &str| Error::Parse {
                line: line_no,
                message: format!("invalid {}", what),
            };
            let id: usize = parts[0].parse().map_err(|_| parse_err("point id"))?;
            let x: f64 = parts[1].parse().map_err(|_| parse_err("x coordinate"))?;
            let y: f64 = parts[2].parse().map_err(|_| parse_err("y coordinate"))?;
            points.push(Point::new(id, x, y));
        }

        if let Some(dim) = dimension {
            if dim != points.len() {
                log::warn!(
                    "DIMENSION is {} but {} coordinates were read",
                    dim,
                    points.len()
                );
            }
        }

        if name.is_empty() {
            name = fallback_name.to_string();
        }

        Ok(Instance { name, comment, points })
    }

    /// Number of points
    pub fn dimension(&self) -> usize {
        self.points.len()
    }

    /// Point ids in file order
    pub fn ids(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.id).collect()
    }

    /// Look up a point by id
    pub fn point(&self, id: usize) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Bounding box `(min_x, max_x, min_y, max_y)`, `None` for an empty instance
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for p in &self.points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        Some((min_x, max_x, min_y, max_y))
    }

    /// Get statistics about the instance
    pub fn statistics(&self, matrix: &DistanceMatrix) -> InstanceStatistics {
        let n = matrix.len();
        let mut distances: Vec<f64> = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                distances.push(matrix.get(i, j));
            }
        }

        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let min_distance = distances.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension(),
            bounds: self.bounds(),
            avg_distance,
            min_distance: if distances.is_empty() { 0.0 } else { min_distance },
            max_distance,
        }
    }
}

/// Statistics about an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub bounds: Option<(f64, f64, f64, f64)>,
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Points: {}", self.dimension)?;
        if let Some((min_x, max_x, min_y, max_y)) = self.bounds {
            writeln!(
                f,
                "  Bounding box: [{:.2}, {:.2}] x [{:.2}, {:.2}]",
                min_x, max_x, min_y, max_y
            )?;
        }
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Min distance: {:.2}", self.min_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}

/// Load every `.tsp` file of a directory, sorted by dimension.
/// Files that fail to parse are skipped with a warning.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Instance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e == "tsp").unwrap_or(false) {
            match Instance::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => log::warn!("skipping {}: {}", path.display(), e),
            }
        }
    }

    instances.sort_by_key(|i| i.dimension());

    Ok(instances)
}
