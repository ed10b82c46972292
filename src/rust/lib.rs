//! Runs a Weka attribute-selection sweep and collects the cross-validation
//! metrics of every combination into one table.
//!
//! A sweep is the product of classifiers x feature rankers x top-N attribute
//! counts. Every combination is evaluated by one Weka process; its free-text
//! report is scraped for the positive class's FP rate and ROC area, the
//! negative class's FP rate, and the ranked attribute names.
//!
//! # Basic Usage
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use attrsweep::{
//!     table, Classifier, ConfigurationSpace, Evaluator, ExperimentRunner, Ranker, ReportParser,
//!     RunnerConfig,
//! };
//! use std::path::PathBuf;
//!
//! let configs = ConfigurationSpace::builder()
//!     .add_classifier(Classifier::new("NaiveBayes", "weka.classifiers.bayes.NaiveBayes"))?
//!     .add_ranker(Ranker::new("GainRatio", "weka.attributeSelection.GainRatioAttributeEval"))?
//!     .with_top_counts(vec![5, 10, 20])
//!     .build()?;
//!
//! let runner = ExperimentRunner::new(
//!     Evaluator::with_java("/usr/bin/java"),
//!     ReportParser::default(),
//!     RunnerConfig::default().with_max_parallel(4),
//! )?;
//! let results = runner
//!     .run(&configs, "Lymphoma95x4023.arff", &[PathBuf::from("weka.jar")])
//!     .await;
//!
//! table::write_csv("results.csv", &results)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Failure Handling
//!
//! Only invalid input stops a sweep, and it does so before anything runs.
//! An experiment whose process cannot start, times out, is cancelled or
//! prints nothing usable is still present in the [`ResultSet`]; its metric
//! cells show [`table::MISSING`].

pub mod config;
pub mod error;
pub mod evaluator;
pub mod experiment;
pub mod report;
pub mod runner;
pub mod table;

pub use config::{SweepConfig, ToolConfig};
pub use error::{ExternalFailure, SweepError};
pub use evaluator::{CommandLine, EvaluationOutcome, Evaluator, ProcessRunner, TokioProcessRunner};
pub use experiment::{Classifier, ConfigurationSpace, ExperimentConfig, ExperimentPlan, Ranker};
pub use report::{ClassLabels, ColumnLayout, Metrics, ReportParser};
pub use runner::{
    CancelHandle, ExperimentResult, ExperimentRunner, Progress, ResultSet, RunnerConfig, TaskStatus,
};

pub fn init_logger() {
    env_logger::init();
}
