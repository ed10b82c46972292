//! Concurrent execution of a configuration space.
//!
//! Each configuration is one task: run Weka, parse its report, produce one
//! [`ExperimentResult`]. A fixed pool of workers pulls task indices from a
//! shared cursor and hands finished results to a single collector, which is
//! the only writer of the pre-sized result slots. The returned [`ResultSet`]
//! therefore holds exactly one result per configuration, at the index the
//! configuration had in the input, whatever the completion order.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::error::{ExternalFailure, Result, SweepError};
use crate::evaluator::{Evaluator, ProcessRunner};
use crate::experiment::ExperimentConfig;
use crate::report::{Metrics, ReportParser};

/// Scheduling knobs for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Upper bound on concurrently running Weka processes; `None` starts
    /// every experiment at once
    pub max_parallel: Option<usize>,
    /// Per-experiment limit; an expired experiment is recorded as failed
    pub task_timeout: Option<Duration>,
}

impl RunnerConfig {
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = Some(max_parallel);
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_parallel == Some(0) {
            return Err(SweepError::InvalidInput("Parallelism must be at least 1".into()));
        }
        if self.task_timeout == Some(Duration::ZERO) {
            return Err(SweepError::InvalidInput("Task timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Terminal state of one experiment.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    Succeeded,
    Failed(ExternalFailure),
}

/// One row of the sweep: the configuration, what was parsed, and how it ended.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentResult {
    /// Position of the configuration in the submitted sequence
    pub id: usize,
    pub config: ExperimentConfig,
    pub ranked_attributes: Vec<String>,
    pub metrics: Metrics,
    pub status: TaskStatus,
}

impl ExperimentResult {
    pub fn failed(id: usize, config: ExperimentConfig, failure: ExternalFailure) -> Self {
        Self {
            id,
            config,
            ranked_attributes: Vec::new(),
            metrics: Metrics::default(),
            status: TaskStatus::Failed(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }

    pub fn failure(&self) -> Option<&ExternalFailure> {
        match &self.status {
            TaskStatus::Succeeded => None,
            TaskStatus::Failed(failure) => Some(failure),
        }
    }
}

/// All results of one run, addressable by experiment id.
///
/// Holds exactly one entry per submitted configuration, ordered by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    results: Vec<ExperimentResult>,
}

impl ResultSet {
    /// Builds a set from results in any order.
    ///
    /// # Errors
    /// `InvalidInput` if the ids are not exactly `0..len`.
    pub fn from_results(mut results: Vec<ExperimentResult>) -> Result<Self> {
        results.sort_by_key(|r| r.id);
        if let Some((pos, r)) = results.iter().enumerate().find(|(pos, r)| r.id != *pos) {
            return Err(SweepError::InvalidInput(format!(
                "Result ids must cover 0..{} exactly, found id {} at position {}",
                results.len(),
                r.id,
                pos
            )));
        }
        Ok(Self { results })
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&ExperimentResult> {
        self.results.get(id)
    }

    /// Iterates in ascending id order
    pub fn iter(&self) -> std::slice::Iter<'_, ExperimentResult> {
        self.results.iter()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ExperimentResult;
    type IntoIter = std::slice::Iter<'a, ExperimentResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Snapshot passed to the progress callback after each state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub failed: usize,
    pub running: usize,
    pub total: usize,
}

/// Stops a run early.
///
/// Experiments not yet started are recorded as cancelled without launching,
/// and running Weka processes are killed and recorded as cancelled. Results
/// that already finished are kept. A runner stays cancelled once cancelled.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    signal: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        if !self.signal.send_replace(true) {
            info!("Cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }
}

type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Runs every configuration of a sweep through an [`Evaluator`].
pub struct ExperimentRunner<R: ProcessRunner> {
    evaluator: Arc<Evaluator<R>>,
    parser: ReportParser,
    config: RunnerConfig,
    cancel: Arc<watch::Sender<bool>>,
    on_progress: Option<ProgressCallback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

enum WorkerEvent {
    Started(usize),
    Finished(ExperimentResult),
}

struct Shared<R: ProcessRunner> {
    evaluator: Arc<Evaluator<R>>,
    parser: ReportParser,
    configs: Vec<ExperimentConfig>,
    data_file: PathBuf,
    search_path: Vec<PathBuf>,
    task_timeout: Option<Duration>,
}

impl<R: ProcessRunner> ExperimentRunner<R> {
    /// # Errors
    /// `InvalidInput` if `config` asks for zero parallelism or a zero timeout.
    pub fn new(
        evaluator: Evaluator<R>,
        parser: ReportParser,
        config: RunnerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let (cancel, _) = watch::channel(false);
        Ok(Self {
            evaluator: Arc::new(evaluator),
            parser,
            config,
            cancel: Arc::new(cancel),
            on_progress: None,
        })
    }

    /// Registers a callback invoked on every task start and completion
    pub fn with_progress(mut self, callback: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            signal: Arc::clone(&self.cancel),
        }
    }

    /// Runs all configurations and waits for every one of them to finish,
    /// fail, or be cancelled.
    ///
    /// Failures of individual experiments never abort the run; they appear
    /// in the returned set with empty metrics and attributes.
    pub async fn run(
        &self,
        configs: &[ExperimentConfig],
        data_file: impl Into<PathBuf>,
        search_path: &[PathBuf],
    ) -> ResultSet {
        let total = configs.len();
        if total == 0 {
            return ResultSet::default();
        }

        let shared = Arc::new(Shared {
            evaluator: Arc::clone(&self.evaluator),
            parser: self.parser.clone(),
            configs: configs.to_vec(),
            data_file: data_file.into(),
            search_path: search_path.to_vec(),
            task_timeout: self.config.task_timeout,
        });
        let workers = self.config.max_parallel.map_or(total, |limit| limit.min(total));
        info!("Running {} experiments on {} workers", total, workers);

        let started = Instant::now();
        let cursor = Arc::new(AtomicUsize::new(0));
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let mut pool = JoinSet::new();
        for _ in 0..workers {
            pool.spawn(worker(
                Arc::clone(&shared),
                Arc::clone(&cursor),
                events_tx.clone(),
                self.cancel.subscribe(),
            ));
        }
        drop(events_tx);

        let mut slots: Vec<Option<ExperimentResult>> = vec![None; total];
        let mut states = vec![TaskState::Pending; total];
        let mut progress = Progress {
            completed: 0,
            failed: 0,
            running: 0,
            total,
        };

        while let Some(event) = events.recv().await {
            match event {
                WorkerEvent::Started(id) => {
                    debug_assert_eq!(states[id], TaskState::Pending);
                    states[id] = TaskState::Running;
                    progress.running += 1;
                }
                WorkerEvent::Finished(result) => {
                    let id = result.id;
                    if states[id] == TaskState::Running {
                        progress.running -= 1;
                    }
                    progress.completed += 1;
                    match result.failure() {
                        None => {
                            states[id] = TaskState::Succeeded;
                            info!(
                                "[{}/{}] {} finished",
                                progress.completed,
                                total,
                                result.config.label()
                            );
                        }
                        Some(failure) => {
                            states[id] = TaskState::Failed;
                            progress.failed += 1;
                            warn!(
                                "[{}/{}] {} failed: {}",
                                progress.completed,
                                total,
                                result.config.label(),
                                failure
                            );
                        }
                    }
                    debug_assert!(slots[id].is_none(), "experiment {} reported twice", id);
                    slots[id] = Some(result);
                }
            }
            if let Some(callback) = &self.on_progress {
                callback(progress);
            }
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!("Experiment worker stopped abnormally: {}", e);
            }
        }

        let mut results = Vec::with_capacity(total);
        for (id, slot) in slots.into_iter().enumerate() {
            let result = match slot {
                Some(result) => result,
                None => {
                    error!("Experiment {} never reported a result", id);
                    if states[id] == TaskState::Running {
                        progress.running -= 1;
                    }
                    progress.completed += 1;
                    progress.failed += 1;
                    if let Some(callback) = &self.on_progress {
                        callback(progress);
                    }
                    let config = shared.configs[id].clone();
                    ExperimentResult::failed(id, config, ExternalFailure::Panicked)
                }
            };
            results.push(result);
        }
        let results = ResultSet { results };

        info!(
            "Sweep finished in {:.2?}: {} succeeded, {} failed",
            started.elapsed(),
            results.succeeded(),
            results.failed()
        );
        results
    }
}

async fn worker<R: ProcessRunner>(
    shared: Arc<Shared<R>>,
    cursor: Arc<AtomicUsize>,
    events: mpsc::UnboundedSender<WorkerEvent>,
    cancel: watch::Receiver<bool>,
) {
    loop {
        let id = cursor.fetch_add(1, Ordering::SeqCst);
        let Some(config) = shared.configs.get(id) else { break };

        let result = if *cancel.borrow() {
            ExperimentResult::failed(id, config.clone(), ExternalFailure::Cancelled)
        } else {
            if events.send(WorkerEvent::Started(id)).is_err() {
                break;
            }
            // A panic must cost only this experiment, not the worker's queue
            let mut experiment = ExperimentTask(tokio::spawn(run_experiment(
                Arc::clone(&shared),
                id,
                cancel.clone(),
            )));
            match (&mut experiment.0).await {
                Ok(result) => result,
                Err(e) => {
                    error!("Experiment {} ({}) panicked: {}", id, config.label(), e);
                    ExperimentResult::failed(id, config.clone(), ExternalFailure::Panicked)
                }
            }
        };

        if events.send(WorkerEvent::Finished(result)).is_err() {
            break;
        }
    }
}

/// Aborts the spawned experiment if the worker is dropped mid-run, so its
/// Weka process is killed along with it.
struct ExperimentTask(JoinHandle<ExperimentResult>);

impl Drop for ExperimentTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn run_experiment<R: ProcessRunner>(
    shared: Arc<Shared<R>>,
    id: usize,
    mut cancel: watch::Receiver<bool>,
) -> ExperimentResult {
    let config = &shared.configs[id];
    debug!("Starting experiment {} ({})", id, config.label());
    let evaluation = shared.evaluator.evaluate(config, &shared.data_file, &shared.search_path);
    let bounded = async {
        match shared.task_timeout {
            Some(limit) => match tokio::time::timeout(limit, evaluation).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ExternalFailure::Timeout(limit)),
            },
            None => evaluation.await,
        }
    };

    let outcome = tokio::select! {
        outcome = bounded => outcome,
        _ = cancelled(&mut cancel) => Err(ExternalFailure::Cancelled),
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(failure) => return ExperimentResult::failed(id, config.clone(), failure),
    };

    let metrics = shared.parser.extract_metrics(&outcome.stdout);
    let ranked_attributes = shared
        .parser
        .extract_ranked_attributes(&outcome.stdout, config.top_attribute_count as usize);

    if !outcome.exit_succeeded && metrics.is_empty() && ranked_attributes.is_empty() {
        if let Some(line) = outcome.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            debug!("Experiment {} stderr: {}", id, line.trim());
        }
        return ExperimentResult::failed(
            id,
            config.clone(),
            ExternalFailure::NoUsableOutput {
                exit_code: outcome.exit_code,
            },
        );
    }
    if metrics.is_empty() {
        debug!("Experiment {} report had no cross-validation metrics", id);
    }

    ExperimentResult {
        id,
        config: config.clone(),
        ranked_attributes,
        metrics,
        status: TaskStatus::Succeeded,
    }
}

/// Resolves once the cancel flag is raised; never resolves if the flag's
/// owner is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|raised| *raised).await.is_err() {
        std::future::pending::<()>().await;
    }
}
