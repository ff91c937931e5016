//! Post-run analysis of a [`ResultsCollection`]: best and fastest method,
//! gap to the best cost and time ratio to the fastest method.

use crate::comparison::ResultsCollection;
use serde::{Deserialize, Serialize};

/// Relative standing of one method
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodComparison {
    /// `(cost - best) / best * 100`, zero when the best cost is zero
    pub gap_percentage: f64,
    /// `time / fastest_time`, zero when the fastest time is not positive
    pub time_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub best_cost: Option<f64>,
    pub best_method: Option<String>,
    pub fastest_time: Option<f64>,
    pub fastest_method: Option<String>,
    /// Methods with a cost, in insertion order
    pub per_method: Vec<(String, MethodComparison)>,
}

impl Analysis {
    pub fn get(&self, method: &str) -> Option<&MethodComparison> {
        self.per_method
            .iter()
            .find(|(name, _)| name == method)
            .map(|(_, cmp)| cmp)
    }

    pub fn is_empty(&self) -> bool {
        self.best_cost.is_none()
    }
}

/// Analyze a comparison run.
///
/// Only methods that produced a cost take part. Ties on cost or time go to
/// the method recorded first.
pub fn analyze(results: &ResultsCollection) -> Analysis {
    let mut analysis = Analysis::default();

    let mut best: Option<(&str, f64)> = None;
    let mut fastest: Option<(&str, f64)> = None;
    for record in results.iter() {
        let cost = match record.cost_total() {
            Some(cost) => cost,
            None => continue,
        };
        if best.map_or(true, |(_, b)| cost < b) {
            best = Some((record.name.as_str(), cost));
        }
        if let Some(time) = record.time_seconds {
            if fastest.map_or(true, |(_, f)| time < f) {
                fastest = Some((record.name.as_str(), time));
            }
        }
    }

    let (best_method, best_cost) = match best {
        Some(best) => best,
        None => return analysis,
    };
    analysis.best_cost = Some(best_cost);
    analysis.best_method = Some(best_method.to_string());
    if let Some((method, time)) = fastest {
        analysis.fastest_time = Some(time);
        analysis.fastest_method = Some(method.to_string());
    }

    for record in results.iter() {
        let cost = match record.cost_total() {
            Some(cost) => cost,
            None => continue,
        };
        let gap_percentage = if best_cost != 0.0 {
            (cost - best_cost) / best_cost * 100.0
        } else {
            0.0
        };
        let time_ratio = match (record.time_seconds, analysis.fastest_time) {
            (Some(time), Some(fastest)) if fastest > 0.0 => time / fastest,
            _ => 0.0,
        };
        analysis.per_method.push((
            record.name.clone(),
            MethodComparison {
                gap_percentage,
                time_ratio,
            },
        ));
    }

    analysis
}
