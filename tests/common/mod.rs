#![allow(dead_code)]

use attrsweep::{
    Classifier, CommandLine, EvaluationOutcome, ExperimentConfig, ProcessRunner, Ranker,
};
use env_logger::{Builder, Env};
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

pub const REPORT: &str = include_str!("../data/attribute_selected_nb.txt");

type Respond = dyn Fn(&CommandLine) -> (Duration, io::Result<EvaluationOutcome>) + Send + Sync;

/// In-process stand-in for Weka that answers from a closure after an
/// optional (tokio) delay and records how many calls overlap.
pub struct StubRunner {
    respond: Box<Respond>,
    pub calls: Arc<AtomicUsize>,
    pub active: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

impl StubRunner {
    pub fn new(
        respond: impl Fn(&CommandLine) -> (Duration, io::Result<EvaluationOutcome>)
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            calls: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answers every command with a synthetic report for its configuration
    pub fn reporting() -> Self {
        Self::new(|command| (Duration::ZERO, Ok(success(synthetic_report(command)))))
    }
}

impl ProcessRunner for StubRunner {
    fn run(
        &self,
        command: &CommandLine,
    ) -> impl Future<Output = io::Result<EvaluationOutcome>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, response) = (self.respond)(command);
        let active = Arc::clone(&self.active);
        let peak = Arc::clone(&self.peak);
        async move {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            active.fetch_sub(1, Ordering::SeqCst);
            response
        }
    }
}

pub fn success(stdout: String) -> EvaluationOutcome {
    EvaluationOutcome {
        exit_succeeded: true,
        exit_code: Some(0),
        stdout,
        stderr: String::new(),
    }
}

pub fn exit_failure(code: i32, stderr: &str) -> EvaluationOutcome {
    EvaluationOutcome {
        exit_succeeded: false,
        exit_code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

fn arg_after<'a>(command: &'a CommandLine, flag: &str) -> &'a str {
    let pos = command
        .args
        .iter()
        .position(|a| a == flag)
        .unwrap_or_else(|| panic!("{} missing from {:?}", flag, command.args));
    &command.args[pos + 1]
}

pub fn ranker_of(command: &CommandLine) -> &str {
    arg_after(command, "-E")
}

pub fn classifier_of(command: &CommandLine) -> &str {
    arg_after(command, "-W")
}

pub fn top_count_of(command: &CommandLine) -> u32 {
    arg_after(command, "-S")
        .split_whitespace()
        .last()
        .and_then(|n| n.parse().ok())
        .expect("ranker search without -N")
}

/// A Weka-shaped report whose numbers depend only on the configuration
pub fn synthetic_report(command: &CommandLine) -> String {
    let n = top_count_of(command);
    let ranker = ranker_of(command).rsplit('.').next().unwrap_or_default().to_string();
    let classifier = classifier_of(command).len();

    let mut report =
        String::from("=== Attribute Selection on all input data ===\n\nRanked attributes:\n");
    for rank in 0..n {
        report.push_str(&format!(" 0.{:04}  {:>4} {}_{}\n", 9000 - rank, rank + 1, ranker, rank));
    }
    report.push_str("\nSelected attributes: 1 : 1\n\n=== Stratified cross-validation ===\n\n");
    report.push_str("                 TP Rate  FP Rate  Precision  Recall   F-Measure  MCC      ROC Area  PRC Area  Class\n");
    report.push_str(&format!(
        "                 0.900    0.{:03}    0.900      0.900    0.900      0.800    0.{:03}     0.900     ACL\n",
        n, classifier
    ));
    report.push_str(&format!(
        "                 0.900    0.{:03}    0.900      0.900    0.900      0.800    0.950     0.900     nonACL\n",
        n + 1
    ));
    report.push_str("\n=== Confusion Matrix ===\n");
    report
}

pub fn classifiers() -> Vec<Classifier> {
    vec![
        Classifier::new("NaiveBayes", "weka.classifiers.bayes.NaiveBayes"),
        Classifier::new("J48", "weka.classifiers.trees.J48 -C 0.25 -M 2"),
        Classifier::new("IBk", "weka.classifiers.lazy.IBk -K 3"),
    ]
}

pub fn rankers() -> Vec<Ranker> {
    vec![
        Ranker::new("GainRatio", "weka.attributeSelection.GainRatioAttributeEval"),
        Ranker::new("InfoGain", "weka.attributeSelection.InfoGainAttributeEval"),
    ]
}

pub fn configs(top_counts: &[u32]) -> Vec<ExperimentConfig> {
    attrsweep::experiment::space::build(&classifiers(), &rankers(), top_counts)
        .expect("valid space")
}
