//! Station Tour Library
//!
//! Selects `p` stations among a set of planar points and routes a closed
//! tour through them, minimizing
//! `alpha * cycle_length + (1 - alpha) * assignment_cost` where the
//! assignment cost sums the distance of every other point to its nearest
//! station.
//!
//! # Features
//!
//! - TSPLIB-like instance parsing and a dense distance matrix
//! - Grid and random station selection, nearest-neighbor tours and 2-opt
//! - Simulated annealing over station sets
//! - Exact solving by subset enumeration and Held-Karp
//! - Method comparison, analysis, text/CSV reports and SVG drawings
//!
//! # Example
//!
//! ```no_run
//! use station_tour::analysis::analyze;
//! use station_tour::comparison::compare_methods;
//! use station_tour::instance::Instance;
//!
//! let instance = Instance::from_file("instance.tsp").unwrap();
//! let results = compare_methods(&instance, 5, 0.5, true).unwrap();
//! let analysis = analyze(&results);
//!
//! println!("Best method: {:?}", analysis.best_method);
//! ```

pub mod error;
pub mod instance;
pub mod distance;
pub mod solution;
pub mod heuristics;
pub mod exact;
pub mod comparison;
pub mod analysis;
pub mod report;
pub mod visualization;

pub use distance::DistanceMatrix;
pub use error::{Error, Result};
pub use instance::{Instance, Point};
pub use solution::Solution;
