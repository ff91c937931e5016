//! Reporting: text reports, multi-instance tables, CSV export and
//! per-method statistics across instances.

use crate::analysis::{analyze, Analysis};
use crate::comparison::ResultsCollection;
use crate::error::Result;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::Path;

const RULE_WIDTH: usize = 80;

fn or_na(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Render the report of one comparison run.
pub fn format_report(results: &ResultsCollection, analysis: &Analysis, timestamp: &str) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("{}\n", heavy));
    out.push_str(&format!("Date: {}\n", timestamp));
    out.push_str(&format!("Instance: {}\n", results.instance));
    out.push_str(&format!("Points: {}\n", results.dimension));
    out.push_str(&format!("Stations: {}\n", results.p));
    out.push_str(&format!("Alpha: {}\n", results.alpha));
    out.push_str(&format!("{}\n\n", heavy));

    out.push_str("COMPARISON\n");
    out.push_str(&format!("{}\n", light));
    out.push_str(&format!(
        "{:<25} {:>12} {:>12} {:>14} {:>12}\n",
        "Method", "Total cost", "Time (s)", "Cycle length", "Status"
    ));
    out.push_str(&format!("{}\n", light));
    for record in results.iter() {
        let time = record
            .time_seconds
            .map(|t| format!("{:.4}", t))
            .unwrap_or_else(|| "N/A".to_string());
        out.push_str(&format!(
            "{:<25} {:>12} {:>12} {:>14} {:>12}\n",
            record.name,
            or_na(record.cost_total()),
            time,
            or_na(record.cycle_length()),
            record.status()
        ));
    }
    out.push_str(&format!("{}\n\n", light));

    out.push_str("DETAILS\n");
    out.push_str(&format!("{}\n", light));
    for record in results.iter() {
        out.push_str(&format!("\n{}\n", record.name.to_uppercase()));
        out.push_str(&format!("  Total cost: {}\n", or_na(record.cost_total())));
        out.push_str(&format!("  Cycle length: {}\n", or_na(record.cycle_length())));
        out.push_str(&format!("  Assignment cost: {}\n", or_na(record.assignment_cost())));
        out.push_str(&format!("  Time: {}\n", or_na(record.time_seconds)));
        out.push_str(&format!("  Status: {}\n", record.status()));
        if let Some(bound) = record.lower_bound() {
            out.push_str(&format!("  Lower bound: {:.2}\n", bound));
        }
        if let Some(iterations) = record.iterations() {
            out.push_str(&format!("  Iterations: {}\n", iterations));
        }
        if let Some(stations) = record.stations() {
            out.push_str(&format!("  Stations: {:?}\n", stations));
        }
        if let Some(error) = record.error() {
            out.push_str(&format!("  Error: {}\n", error));
        }
    }

    out.push_str("\nANALYSIS\n");
    out.push_str(&format!("{}\n", light));
    out.push_str(&format_analysis(analysis));
    out.push_str(&format!("\n{}\n\n", heavy));
    out
}

/// Render the best/fastest summary and per-method gaps.
pub fn format_analysis(analysis: &Analysis) -> String {
    let mut out = String::new();
    match (&analysis.best_method, analysis.best_cost) {
        (Some(method), Some(cost)) => {
            out.push_str(&format!("Best method: {} (cost {:.2})\n", method, cost));
        }
        _ => {
            out.push_str("No method produced a solution\n");
            return out;
        }
    }
    if let (Some(method), Some(time)) = (&analysis.fastest_method, analysis.fastest_time) {
        out.push_str(&format!("Fastest method: {} ({:.4}s)\n", method, time));
    }
    for (name, cmp) in &analysis.per_method {
        out.push_str(&format!(
            "  {:<25} gap {:>8.2}%  time x{:.2}\n",
            name, cmp.gap_percentage, cmp.time_ratio
        ));
    }
    out
}

/// Append the report of one run to `path`, creating parent directories.
pub fn save_report<P: AsRef<Path>>(results: &ResultsCollection, analysis: &Analysis, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format_report(results, analysis, &timestamp).as_bytes())?;
    log::info!("report appended to {}", path.display());
    Ok(())
}

/// One line per instance and solved method.
pub fn comparison_table(runs: &[ResultsCollection]) -> String {
    let rule = "=".repeat(100);
    let mut out = String::new();
    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!(
        "{:<20} {:>5} {:>5} {:<22} {:>12} {:>10} {:>12}\n",
        "Instance", "n", "p", "Method", "Cost", "Time (s)", "Gap (%)"
    ));
    out.push_str(&format!("{}\n", rule));

    for results in runs {
        let analysis = analyze(results);
        for record in results.iter() {
            let cost = match record.cost_total() {
                Some(cost) => cost,
                None => continue,
            };
            let gap = analysis
                .get(&record.name)
                .map(|c| c.gap_percentage)
                .unwrap_or(0.0);
            out.push_str(&format!(
                "{:<20} {:>5} {:>5} {:<22} {:>12.2} {:>10.4} {:>12.2}\n",
                results.instance,
                results.dimension,
                results.p,
                record.name,
                cost,
                record.time_seconds.unwrap_or(0.0),
                gap
            ));
        }
    }
    out.push_str(&format!("{}\n", rule));
    out
}

/// Flat CSV row for one instance and method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvRecord {
    pub instance: String,
    pub dimension: usize,
    pub p: usize,
    pub alpha: f64,
    pub method: String,
    pub status: String,
    pub cost_total: Option<f64>,
    pub cycle_length: Option<f64>,
    pub assignment_cost: Option<f64>,
    pub time_seconds: Option<f64>,
    pub lower_bound: Option<f64>,
    pub gap_percentage: Option<f64>,
    pub iterations: Option<usize>,
}

pub fn csv_records(runs: &[ResultsCollection]) -> Vec<CsvRecord> {
    let mut rows = Vec::new();
    for results in runs {
        let analysis = analyze(results);
        for record in results.iter() {
            rows.push(CsvRecord {
                instance: results.instance.clone(),
                dimension: results.dimension,
                p: results.p,
                alpha: results.alpha,
                method: record.name.clone(),
                status: record.status().to_string(),
                cost_total: record.cost_total(),
                cycle_length: record.cycle_length(),
                assignment_cost: record.assignment_cost(),
                time_seconds: record.time_seconds,
                lower_bound: record.lower_bound(),
                gap_percentage: analysis.get(&record.name).map(|c| c.gap_percentage),
                iterations: record.iterations(),
            });
        }
    }
    rows
}

/// Export results to CSV
pub fn export_csv<P: AsRef<Path>>(runs: &[ResultsCollection], path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for row in csv_records(runs) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Aggregated statistics for a method across instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodStatistics {
    pub method: String,
    /// Instances the method was recorded on
    pub runs: usize,
    /// Instances where it produced a cost
    pub solved: usize,
    pub mean_cost: f64,
    pub std_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    pub mean_gap: f64,
    pub max_gap: f64,
    pub mean_time: f64,
}

fn spread(values: &[f64]) -> f64 {
    if values.len() < 2 {
        0.0
    } else {
        Statistics::std_dev(values)
    }
}

/// Compute statistics for each method, in first-seen order. Methods that
/// never produced a cost are left out.
pub fn method_statistics(runs: &[ResultsCollection]) -> Vec<MethodStatistics> {
    let mut order: Vec<String> = Vec::new();
    for results in runs {
        for record in results.iter() {
            if !order.contains(&record.name) {
                order.push(record.name.clone());
            }
        }
    }
    let analyses: Vec<Analysis> = runs.iter().map(analyze).collect();

    let mut statistics = Vec::new();
    for method in order {
        let mut recorded = 0;
        let mut costs = Vec::new();
        let mut gaps = Vec::new();
        let mut times = Vec::new();
        for (results, analysis) in runs.iter().zip(&analyses) {
            let record = match results.get(&method) {
                Some(record) => record,
                None => continue,
            };
            recorded += 1;
            if let Some(cost) = record.cost_total() {
                costs.push(cost);
                if let Some(time) = record.time_seconds {
                    times.push(time);
                }
                if let Some(cmp) = analysis.get(&method) {
                    gaps.push(cmp.gap_percentage);
                }
            }
        }
        if costs.is_empty() {
            continue;
        }

        statistics.push(MethodStatistics {
            method,
            runs: recorded,
            solved: costs.len(),
            mean_cost: Statistics::mean(&costs),
            std_cost: spread(&costs),
            min_cost: Statistics::min(&costs),
            max_cost: Statistics::max(&costs),
            mean_gap: if gaps.is_empty() { 0.0 } else { Statistics::mean(&gaps) },
            max_gap: if gaps.is_empty() { 0.0 } else { Statistics::max(&gaps) },
            mean_time: if times.is_empty() { 0.0 } else { Statistics::mean(&times) },
        });
    }
    statistics
}

pub fn format_statistics(statistics: &[MethodStatistics]) -> String {
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();
    out.push_str("Method Performance Summary:\n");
    out.push_str(&format!("{}\n", light));
    out.push_str(&format!(
        "{:<22} {:>8} {:>11} {:>9} {:>11} {:>8} {:>8}\n",
        "Method", "Solved", "Avg Cost", "Std", "Best Cost", "Avg Gap", "Avg Time"
    ));
    out.push_str(&format!("{}\n", light));
    for stat in statistics {
        out.push_str(&format!(
            "{:<22} {:>8} {:>11.2} {:>9.2} {:>11.2} {:>7.2}% {:>8.4}\n",
            stat.method,
            format!("{}/{}", stat.solved, stat.runs),
            stat.mean_cost,
            stat.std_cost,
            stat.min_cost,
            stat.mean_gap,
            stat.mean_time
        ));
    }
    out.push_str(&format!("{}\n", light));
    out
}

/// Export per-method statistics to CSV
pub fn export_statistics_csv<P: AsRef<Path>>(runs: &[ResultsCollection], path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for stat in method_statistics(runs) {
        writer.serialize(stat)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::{MethodOutcome, MethodRecord, Solution};

    fn solved(name: &str, cost: f64, time: f64) -> MethodRecord {
        let solution = Solution {
            stations: vec![1, 2],
            cycle: vec![1, 2, 1],
            cycle_length: cost / 2.0,
            assignment_cost: cost / 2.0,
            cost_total: cost,
        };
        MethodRecord::new(name, Some(time), MethodOutcome::Constructive { solution })
    }

    fn run(name: &str, grid: f64, annealing: f64) -> ResultsCollection {
        let mut results = ResultsCollection::new(name, 20, 2, 0.5);
        results.push(solved("heuristic_grid", grid, 0.5)).unwrap();
        results.push(solved("simulated_annealing", annealing, 2.0)).unwrap();
        results
            .push(MethodRecord::new("exact", None, MethodOutcome::InstanceTooLarge))
            .unwrap();
        results
    }

    fn temp_path(file: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("station_tour_{}_{}", std::process::id(), file))
    }

    #[test]
    fn test_format_report() {
        let results = run("inst", 120.0, 100.0);
        let report = format_report(&results, &analyze(&results), "2024-01-01 00:00:00");

        assert!(report.contains("Instance: inst"));
        assert!(report.contains("Best method: simulated_annealing"));
        assert!(report.contains("instance too large"));
        assert!(report.contains("Stations: [1, 2]"));
        assert!(report.contains("N/A"));
    }

    #[test]
    fn test_save_report_appends() {
        let path = temp_path("report.txt");
        let _ = std::fs::remove_file(&path);
        let results = run("inst", 120.0, 100.0);
        let analysis = analyze(&results);

        save_report(&results, &analysis, &path).unwrap();
        save_report(&results, &analysis, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Instance: inst").count(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_comparison_table_skips_unsolved() {
        let table = comparison_table(&[run("a", 120.0, 100.0), run("b", 80.0, 80.0)]);
        assert_eq!(table.matches("heuristic_grid").count(), 2);
        assert!(!table.contains("exact"));
        assert!(table.contains("20.00"));
    }

    #[test]
    fn test_method_statistics() {
        let stats = method_statistics(&[run("a", 120.0, 100.0), run("b", 80.0, 80.0)]);
        assert_eq!(stats.len(), 2);

        let grid = &stats[0];
        assert_eq!(grid.method, "heuristic_grid");
        assert_eq!(grid.solved, 2);
        assert!((grid.mean_cost - 100.0).abs() < 1e-9);
        assert_eq!(grid.min_cost, 80.0);
        assert_eq!(grid.max_cost, 120.0);
        assert!((grid.mean_gap - 10.0).abs() < 1e-9);
        assert!(grid.std_cost > 0.0);

        let sa = &stats[1];
        assert_eq!(sa.mean_gap, 0.0);
        assert!((sa.mean_time - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_export_csv() {
        let path = temp_path("results.csv");
        export_csv(&[run("a", 120.0, 100.0)], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<CsvRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].method, "heuristic_grid");
        assert_eq!(rows[2].cost_total, None);
        assert_eq!(rows[2].status, "instance too large");
        let _ = std::fs::remove_file(&path);
    }
}
