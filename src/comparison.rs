//! Multi-method comparison.
//!
//! Runs the constructive heuristics, the metaheuristic and the exact solver
//! one after another on the same instance, times each of them and collects
//! one [`MethodRecord`] per method. A failing method is recorded as such and
//! never prevents the following ones from running.

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::exact::{EnumerationSolver, ExactSolver};
use crate::heuristics::annealing::{CoolingSchedule, Metaheuristic, SimulatedAnnealing};
use crate::heuristics::initial::{InitialSolutionBuilder, SolutionBuilder};
use crate::heuristics::selection::SelectionMethod;
use crate::instance::Instance;
use crate::solution::{CostModel, MethodOutcome, MethodRecord, Solution};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

pub const GRID_HEURISTIC: &str = "heuristic_grid";
pub const RANDOM_HEURISTIC: &str = "heuristic_random";
pub const SIMULATED_ANNEALING: &str = "simulated_annealing";
pub const EXACT: &str = "exact";

/// Comparison configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Weight of the cycle length in the total cost
    pub alpha: f64,
    /// Run the exact solver on small enough instances
    pub test_exact: bool,
    /// Largest instance (in points) handed to the exact solver
    pub exact_max_points: usize,
    /// Exact solver time limit in seconds
    pub exact_time_limit: f64,
    /// Seed of the random selection and of the annealing
    pub seed: u64,
    /// Apply 2-opt after nearest-neighbor construction
    pub improve: bool,
    pub cooling: CoolingSchedule,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        ComparisonConfig {
            alpha: 0.5,
            test_exact: true,
            exact_max_points: 15,
            exact_time_limit: 300.0,
            seed: 42,
            improve: true,
            cooling: CoolingSchedule::default(),
        }
    }
}

impl ComparisonConfig {
    /// Load a configuration from a JSON file; missing fields take their
    /// default value.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Insertion-ordered results of one comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsCollection {
    pub instance: String,
    pub dimension: usize,
    pub p: usize,
    pub alpha: f64,
    records: Vec<MethodRecord>,
}

impl ResultsCollection {
    pub fn new<S: Into<String>>(instance: S, dimension: usize, p: usize, alpha: f64) -> Self {
        ResultsCollection {
            instance: instance.into(),
            dimension,
            p,
            alpha,
            records: Vec::new(),
        }
    }

    /// Append the record of a completed method. Records are never modified
    /// once added; a second record under the same name is rejected.
    pub fn push(&mut self, record: MethodRecord) -> Result<()> {
        if self.get(&record.name).is_some() {
            return Err(Error::invalid(format!("method {} recorded twice", record.name)));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MethodRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of the per-method times; methods run one after another
    pub fn total_time(&self) -> f64 {
        self.records.iter().filter_map(|r| r.time_seconds).sum()
    }
}

/// Receives progress notifications from a comparison run
pub trait ComparisonObserver {
    fn comparison_started(&self, _results: &ResultsCollection) {}
    /// `solver` is the name of the collaborator running the method
    fn method_started(&self, _index: usize, _name: &str, _solver: &str) {}
    fn method_finished(&self, _record: &MethodRecord) {}
    fn comparison_finished(&self, _results: &ResultsCollection) {}
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ComparisonObserver for NoopObserver {}

/// Observer that reports progress through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ComparisonObserver for LogObserver {
    fn comparison_started(&self, results: &ResultsCollection) {
        log::info!(
            "comparing methods on {} (n={}, p={}, alpha={})",
            results.instance,
            results.dimension,
            results.p,
            results.alpha
        );
    }

    fn method_started(&self, index: usize, name: &str, solver: &str) {
        log::info!("{}. {} ({})...", index, name, solver);
    }

    fn method_finished(&self, record: &MethodRecord) {
        let time = record
            .time_seconds
            .map(|t| format!("{:.2}s", t))
            .unwrap_or_else(|| "-".to_string());
        match record.cost_total() {
            Some(cost) => log::info!(
                "   {}: cost {:.2}, time {} ({})",
                record.name,
                cost,
                time,
                record.status()
            ),
            None => match record.error() {
                Some(error) => log::error!("   {} failed after {}: {}", record.name, time, error),
                None => log::warn!("   {}: {} ({})", record.name, record.status(), time),
            },
        }
        if let Some(bound) = record.lower_bound() {
            log::info!("   lower bound: {:.2}", bound);
        }
    }

    fn comparison_finished(&self, results: &ResultsCollection) {
        log::info!("comparison finished in {:.2}s", results.total_time());
    }
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed().as_secs_f64())
}

/// Runs every method of the comparison on an instance
pub struct Comparison {
    config: ComparisonConfig,
    builder: Box<dyn SolutionBuilder>,
    metaheuristic: Box<dyn Metaheuristic>,
    exact: Box<dyn ExactSolver>,
    observer: Box<dyn ComparisonObserver>,
}

impl Comparison {
    pub fn new(config: ComparisonConfig) -> Self {
        let metaheuristic = SimulatedAnnealing::with_schedule(config.cooling, config.seed);
        Comparison {
            config,
            builder: Box::new(InitialSolutionBuilder),
            metaheuristic: Box::new(metaheuristic),
            exact: Box::new(EnumerationSolver::new()),
            observer: Box::new(NoopObserver),
        }
    }

    pub fn with_builder<B: SolutionBuilder + 'static>(mut self, builder: B) -> Self {
        self.builder = Box::new(builder);
        self
    }

    pub fn with_metaheuristic<M: Metaheuristic + 'static>(mut self, metaheuristic: M) -> Self {
        self.metaheuristic = Box::new(metaheuristic);
        self
    }

    pub fn with_exact_solver<E: ExactSolver + 'static>(mut self, exact: E) -> Self {
        self.exact = Box::new(exact);
        self
    }

    pub fn with_observer<O: ComparisonObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Compare all methods on `instance` with `p` stations.
    ///
    /// Only invalid inputs (duplicate point ids, `p` or `alpha` out of
    /// range) abort the run; method failures are recorded per method.
    pub fn compare(&self, instance: &Instance, p: usize) -> Result<ResultsCollection> {
        let cost = CostModel::new(self.config.alpha)?;
        let n = instance.dimension();
        if p == 0 || p > n {
            return Err(Error::invalid(format!(
                "p must lie in 1..={} for {}, got {}",
                n, instance.name, p
            )));
        }
        let matrix = DistanceMatrix::build(&instance.points)?;

        let mut results = ResultsCollection::new(instance.name.clone(), n, p, cost.alpha);
        self.observer.comparison_started(&results);

        let grid = self.run_constructive(
            &mut results,
            1,
            GRID_HEURISTIC,
            instance,
            &matrix,
            p,
            SelectionMethod::Grid,
            &cost,
        )?;

        self.run_constructive(
            &mut results,
            2,
            RANDOM_HEURISTIC,
            instance,
            &matrix,
            p,
            SelectionMethod::Random {
                seed: self.config.seed,
            },
            &cost,
        )?;

        self.run_metaheuristic(&mut results, instance, &matrix, grid.as_ref(), &cost)?;

        if self.config.test_exact {
            self.run_exact(&mut results, instance, &matrix, p, &cost)?;
        }

        self.observer.comparison_finished(&results);
        Ok(results)
    }

    fn record(&self, results: &mut ResultsCollection, record: MethodRecord) -> Result<()> {
        self.observer.method_finished(&record);
        results.push(record)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_constructive(
        &self,
        results: &mut ResultsCollection,
        index: usize,
        name: &str,
        instance: &Instance,
        matrix: &DistanceMatrix,
        p: usize,
        selection: SelectionMethod,
        cost: &CostModel,
    ) -> Result<Option<Solution>> {
        self.observer.method_started(index, name, self.builder.name());
        let (outcome, time) = timed(|| {
            self.builder
                .build(instance, matrix, p, selection, self.config.improve, cost)
        });

        let (outcome, solution) = match outcome {
            Ok(solution) => (
                MethodOutcome::Constructive {
                    solution: solution.clone(),
                },
                Some(solution),
            ),
            Err(e) => (MethodOutcome::Failed { error: e.to_string() }, None),
        };

        self.record(results, MethodRecord::new(name, Some(time), outcome))?;
        Ok(solution)
    }

    fn run_metaheuristic(
        &self,
        results: &mut ResultsCollection,
        instance: &Instance,
        matrix: &DistanceMatrix,
        seed: Option<&Solution>,
        cost: &CostModel,
    ) -> Result<()> {
        self.observer
            .method_started(3, SIMULATED_ANNEALING, self.metaheuristic.name());

        let record = match seed {
            Some(seed) => {
                let (outcome, time) = timed(|| self.metaheuristic.run(instance, seed, matrix, cost));
                let outcome = match outcome {
                    Ok((solution, iterations)) => MethodOutcome::Metaheuristic {
                        solution,
                        iterations,
                    },
                    Err(e) => MethodOutcome::Failed { error: e.to_string() },
                };
                MethodRecord::new(SIMULATED_ANNEALING, Some(time), outcome)
            }
            None => MethodRecord::new(
                SIMULATED_ANNEALING,
                None,
                MethodOutcome::Failed {
                    error: format!("no seed solution, {} failed", GRID_HEURISTIC),
                },
            ),
        };

        self.record(results, record)
    }

    fn run_exact(
        &self,
        results: &mut ResultsCollection,
        instance: &Instance,
        matrix: &DistanceMatrix,
        p: usize,
        cost: &CostModel,
    ) -> Result<()> {
        self.observer.method_started(4, EXACT, self.exact.name());

        if instance.dimension() > self.config.exact_max_points {
            log::info!(
                "instance too large for exact solving (n={} > {})",
                instance.dimension(),
                self.config.exact_max_points
            );
            return self.record(
                results,
                MethodRecord::new(EXACT, None, MethodOutcome::InstanceTooLarge),
            );
        }

        let time_limit = match Duration::try_from_secs_f64(self.config.exact_time_limit.max(0.0)) {
            Ok(limit) => limit,
            Err(e) => {
                let error = format!(
                    "invalid exact time limit {}: {}",
                    self.config.exact_time_limit, e
                );
                return self.record(
                    results,
                    MethodRecord::new(EXACT, None, MethodOutcome::Failed { error }),
                );
            }
        };
        let (outcome, time) = timed(|| self.exact.solve(instance, matrix, p, cost, time_limit));

        let outcome = match outcome {
            Ok(Some(result)) => MethodOutcome::Exact {
                solution: result.solution,
                status: result.status,
                lower_bound: result.lower_bound,
            },
            Ok(None) => MethodOutcome::Unsolved,
            Err(e) => MethodOutcome::Failed { error: e.to_string() },
        };

        self.record(results, MethodRecord::new(EXACT, Some(time), outcome))
    }
}

/// Compare all methods with the default configuration apart from `alpha`
/// and `test_exact`.
pub fn compare_methods(
    instance: &Instance,
    p: usize,
    alpha: f64,
    test_exact: bool,
) -> Result<ResultsCollection> {
    let config = ComparisonConfig {
        alpha,
        test_exact,
        ..Default::default()
    };
    Comparison::new(config).compare(instance, p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::ExactResult;
    use crate::instance::Point;
    use crate::solution::{ExactStatus, MethodStatus};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn instance(n: usize) -> Instance {
        let points = (0..n)
            .map(|i| {
                let angle = i as f64 * 2.4;
                Point::new(i + 1, (i as f64) * angle.cos(), (i as f64) * angle.sin())
            })
            .collect();
        Instance::new(format!("spiral{}", n), points)
    }

    fn quick_config() -> ComparisonConfig {
        ComparisonConfig {
            cooling: CoolingSchedule {
                initial_temp: 10.0,
                final_temp: 1.0,
                cooling_rate: 0.5,
                iterations_per_temp: 5,
            },
            ..Default::default()
        }
    }

    struct FailingBuilder;

    impl SolutionBuilder for FailingBuilder {
        fn build(
            &self,
            _instance: &Instance,
            _matrix: &DistanceMatrix,
            _p: usize,
            _selection: SelectionMethod,
            _improve: bool,
            _cost: &CostModel,
        ) -> Result<Solution> {
            Err(Error::KeyNotFound(99))
        }

        fn name(&self) -> &str {
            "Failing"
        }
    }

    struct NoSolutionSolver {
        delay: Duration,
    }

    impl ExactSolver for NoSolutionSolver {
        fn solve(
            &self,
            _instance: &Instance,
            _matrix: &DistanceMatrix,
            _p: usize,
            _cost: &CostModel,
            _time_limit: Duration,
        ) -> Result<Option<ExactResult>> {
            std::thread::sleep(self.delay);
            Ok(None)
        }

        fn name(&self) -> &str {
            "NoSolution"
        }
    }

    #[derive(Clone, Default)]
    struct RecordingObserver {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl ComparisonObserver for RecordingObserver {
        fn method_started(&self, index: usize, name: &str, solver: &str) {
            self.events
                .borrow_mut()
                .push(format!("start {} {} {}", index, name, solver));
        }

        fn method_finished(&self, record: &MethodRecord) {
            self.events.borrow_mut().push(format!("done {}", record.name));
        }
    }

    #[test]
    fn test_all_methods_in_order() {
        let results = Comparison::new(quick_config()).compare(&instance(10), 3).unwrap();

        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![GRID_HEURISTIC, RANDOM_HEURISTIC, SIMULATED_ANNEALING, EXACT]);
        for record in results.iter() {
            assert!(record.cost_total().is_some(), "{} has no cost", record.name);
            assert!(record.time_seconds.is_some());
        }

        let exact = results.get(EXACT).unwrap();
        assert_eq!(exact.status(), MethodStatus::Optimal);
        for record in results.iter() {
            assert!(exact.cost_total().unwrap() <= record.cost_total().unwrap() + 1e-9);
        }

        let sa = results.get(SIMULATED_ANNEALING).unwrap();
        let grid = results.get(GRID_HEURISTIC).unwrap();
        assert!(sa.cost_total().unwrap() <= grid.cost_total().unwrap() + 1e-9);
        assert_eq!(sa.iterations(), Some(20));

        let total: f64 = results.iter().filter_map(|r| r.time_seconds).sum();
        assert_eq!(results.total_time(), total);
    }

    #[test]
    fn test_instance_too_large() {
        let results = Comparison::new(quick_config()).compare(&instance(20), 3).unwrap();
        let exact = results.get(EXACT).unwrap();
        assert_eq!(exact.cost_total(), None);
        assert_eq!(exact.status().to_string(), "instance too large");
        assert_eq!(exact.time_seconds, None);
    }

    #[test]
    fn test_exact_skipped_when_disabled() {
        let config = ComparisonConfig {
            test_exact: false,
            ..quick_config()
        };
        let results = Comparison::new(config).compare(&instance(8), 2).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.get(EXACT).is_none());
    }

    #[test]
    fn test_unsolved_exact_keeps_elapsed_time() {
        let delay = Duration::from_millis(20);
        let results = Comparison::new(quick_config())
            .with_exact_solver(NoSolutionSolver { delay })
            .compare(&instance(6), 2)
            .unwrap();

        let exact = results.get(EXACT).unwrap();
        assert_eq!(exact.cost_total(), None);
        assert_eq!(exact.status().to_string(), "unsolved");
        assert!(exact.time_seconds.unwrap() >= delay.as_secs_f64());
    }

    #[test]
    fn test_failures_are_isolated() {
        let results = Comparison::new(quick_config())
            .with_builder(FailingBuilder)
            .compare(&instance(6), 2)
            .unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results.get(GRID_HEURISTIC).unwrap().status(), MethodStatus::Failed);
        assert_eq!(results.get(RANDOM_HEURISTIC).unwrap().status(), MethodStatus::Failed);
        let sa = results.get(SIMULATED_ANNEALING).unwrap();
        assert_eq!(sa.status(), MethodStatus::Failed);
        assert_eq!(sa.time_seconds, None);

        let exact = results.get(EXACT).unwrap();
        assert!(matches!(
            exact.outcome,
            MethodOutcome::Exact {
                status: ExactStatus::Optimal,
                ..
            }
        ));
    }

    #[test]
    fn test_observer_notified() {
        let observer = RecordingObserver::default();
        let events = observer.events.clone();
        Comparison::new(quick_config())
            .with_observer(observer)
            .compare(&instance(6), 2)
            .unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 8);
        assert_eq!(events[0], format!("start 1 {} InitialSolution", GRID_HEURISTIC));
        assert_eq!(events[4], format!("start 3 {} SimulatedAnnealing", SIMULATED_ANNEALING));
        assert_eq!(events[6], format!("start 4 {} Enumeration", EXACT));
        assert_eq!(events[7], format!("done {}", EXACT));
    }

    #[test]
    fn test_invalid_inputs_abort() {
        let comparison = Comparison::new(quick_config());
        assert!(comparison.compare(&instance(5), 0).is_err());
        assert!(comparison.compare(&instance(5), 6).is_err());

        let duplicated = Instance::new(
            "dup",
            vec![Point::new(1, 0.0, 0.0), Point::new(1, 1.0, 0.0)],
        );
        assert!(matches!(
            comparison.compare(&duplicated, 1),
            Err(Error::InvalidInput(_))
        ));

        let config = ComparisonConfig {
            alpha: 2.0,
            ..quick_config()
        };
        assert!(Comparison::new(config).compare(&instance(5), 2).is_err());
    }

    #[test]
    fn test_unrepresentable_time_limit_fails_exact_only() {
        let config: ComparisonConfig =
            serde_json::from_str(r#"{"exact_time_limit": 1e300}"#).unwrap();
        let config = ComparisonConfig {
            cooling: quick_config().cooling,
            ..config
        };
        let results = Comparison::new(config).compare(&instance(5), 2).unwrap();

        assert_eq!(results.len(), 4);
        let exact = results.get(EXACT).unwrap();
        assert_eq!(exact.status(), MethodStatus::Failed);
        assert!(exact.error().unwrap().contains("time limit"));
        assert_eq!(exact.time_seconds, None);
        assert_eq!(results.get(GRID_HEURISTIC).unwrap().status(), MethodStatus::Completed);

        let config = ComparisonConfig {
            exact_time_limit: f64::INFINITY,
            ..quick_config()
        };
        let results = Comparison::new(config).compare(&instance(5), 2).unwrap();
        assert_eq!(results.get(EXACT).unwrap().status(), MethodStatus::Failed);
    }

    #[test]
    fn test_duplicate_record_rejected() {
        let mut results = ResultsCollection::new("x", 3, 1, 0.5);
        results
            .push(MethodRecord::new(EXACT, None, MethodOutcome::InstanceTooLarge))
            .unwrap();
        assert!(results
            .push(MethodRecord::new(EXACT, None, MethodOutcome::Unsolved))
            .is_err());
    }

    #[test]
    fn test_config_json_defaults() {
        let config: ComparisonConfig = serde_json::from_str(r#"{"alpha": 0.3}"#).unwrap();
        assert_eq!(config.alpha, 0.3);
        assert_eq!(config.exact_max_points, 15);
        assert_eq!(config.exact_time_limit, 300.0);
    }
}
