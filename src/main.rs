//! Station tour comparison - Command Line Interface
//!
//! Selects `p` stations among the points of an instance, routes a closed
//! tour through them and compares heuristic, metaheuristic and exact
//! methods on the weighted tour/assignment cost.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use station_tour::analysis::analyze;
use station_tour::comparison::{Comparison, ComparisonConfig, LogObserver, ResultsCollection};
use station_tour::distance::DistanceMatrix;
use station_tour::error::Result;
use station_tour::instance::{load_instances_from_dir, Instance};
use station_tour::report;
use station_tour::visualization::Visualizer;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "station-tour")]
#[command(version = "1.0")]
#[command(about = "Compare station selection and tour methods on TSPLIB-like instances")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunOptions {
    /// Number of stations to select
    #[arg(short = 'p', long)]
    stations: usize,

    /// Weight of the cycle length in the total cost (in [0, 1])
    #[arg(short, long)]
    alpha: Option<f64>,

    /// Skip the exact solver
    #[arg(long)]
    no_exact: bool,

    /// Exact solver time limit in seconds
    #[arg(long)]
    exact_time_limit: Option<f64>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON configuration file; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append the text report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export results to CSV
    #[arg(long)]
    csv: Option<PathBuf>,
}

impl RunOptions {
    fn config(&self) -> Result<ComparisonConfig> {
        let mut config = match &self.config {
            Some(path) => ComparisonConfig::from_json_file(path)?,
            None => ComparisonConfig::default(),
        };
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if self.no_exact {
            config.test_exact = false;
        }
        if let Some(limit) = self.exact_time_limit {
            config.exact_time_limit = limit;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compare all methods on a single instance
    Compare {
        #[arg(short, long)]
        instance: PathBuf,

        #[command(flatten)]
        options: RunOptions,

        /// Draw the best solution as SVG
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Compare all methods on every instance of a directory
    Batch {
        /// Directory containing instance files
        #[arg(short, long)]
        dir: PathBuf,

        #[command(flatten)]
        options: RunOptions,

        /// Export per-method statistics to CSV
        #[arg(long)]
        stats_csv: Option<PathBuf>,
    },

    /// Print instance statistics
    Analyze {
        #[arg(short, long)]
        instance: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Compare { instance, options, svg } => compare_instance(&instance, &options, svg.as_deref()),
        Commands::Batch { dir, options, stats_csv } => run_batch(&dir, &options, stats_csv.as_deref()),
        Commands::Analyze { instance } => analyze_instance(&instance),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn compare_instance(path: &Path, options: &RunOptions, svg: Option<&Path>) -> Result<()> {
    println!("Loading instance from {:?}...", path);
    let instance = Instance::from_file(path)?;
    let config = options.config()?;

    let results = Comparison::new(config)
        .with_observer(LogObserver)
        .compare(&instance, options.stations)?;
    let analysis = analyze(&results);

    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    println!("{}", report::format_report(&results, &analysis, &timestamp));

    if let Some(output) = &options.output {
        report::save_report(&results, &analysis, output)?;
        println!("Report appended to {:?}", output);
    }
    if let Some(csv) = &options.csv {
        report::export_csv(std::slice::from_ref(&results), csv)?;
        println!("Results exported to {:?}", csv);
    }
    if let Some(svg_path) = svg {
        draw_best(&instance, &results, svg_path)?;
    }
    Ok(())
}

fn draw_best(instance: &Instance, results: &ResultsCollection, path: &Path) -> Result<()> {
    let analysis = analyze(results);
    let best = analysis
        .best_method
        .as_deref()
        .and_then(|name| results.get(name))
        .and_then(|record| record.solution().map(|s| (record.name.as_str(), s)));

    match best {
        Some((method, solution)) => {
            let matrix = DistanceMatrix::build(&instance.points)?;
            let visualizer = Visualizer::new();
            let svg = visualizer.generate_svg(instance, &matrix, solution, method)?;
            visualizer.save_svg(&svg, path)?;
            println!("Visualization saved to {:?}", path);
        }
        None => eprintln!("No solution to draw"),
    }
    Ok(())
}

fn run_batch(dir: &Path, options: &RunOptions, stats_csv: Option<&Path>) -> Result<()> {
    println!("Loading instances from {:?}...", dir);
    let instances = load_instances_from_dir(dir)?;
    if instances.is_empty() {
        eprintln!("No instances found!");
        return Ok(());
    }
    println!("Found {} instances", instances.len());

    let comparison = Comparison::new(options.config()?);

    let progress = ProgressBar::new(instances.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
    {
        progress.set_style(style);
    }

    let mut runs = Vec::new();
    for instance in &instances {
        progress.set_message(instance.name.clone());
        match comparison.compare(instance, options.stations) {
            Ok(results) => {
                if let Some(output) = &options.output {
                    report::save_report(&results, &analyze(&results), output)?;
                }
                runs.push(results);
            }
            Err(e) => log::warn!("skipping {}: {}", instance.name, e),
        }
        progress.inc(1);
    }
    progress.finish_with_message("done");

    println!("\n{}", report::comparison_table(&runs));
    println!("{}", report::format_statistics(&report::method_statistics(&runs)));

    if let Some(csv) = &options.csv {
        report::export_csv(&runs, csv)?;
        println!("Results exported to {:?}", csv);
    }
    if let Some(path) = stats_csv {
        report::export_statistics_csv(&runs, path)?;
        println!("Statistics exported to {:?}", path);
    }
    Ok(())
}

fn analyze_instance(path: &Path) -> Result<()> {
    let instance = Instance::from_file(path)?;
    let matrix = DistanceMatrix::build(&instance.points)?;
    println!("{}", instance.statistics(&matrix));
    Ok(())
}
