//! One Weka evaluation per experiment configuration.
//!
//! The evaluator only builds the command line and packages what the process
//! printed. Interpreting the report is left to [`crate::report`].

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::debug;

use crate::error::ExternalFailure;
use crate::experiment::ExperimentConfig;

/// Weka's meta classifier that wraps attribute selection around a base classifier
pub const SUBCOMMAND: &str = "weka.classifiers.meta.AttributeSelectedClassifier";
/// Cross-validation folds passed with `-x`
pub const CROSS_VALIDATION_FOLDS: u32 = 10;
/// Search method that keeps the top N attributes of the ranker's ordering
pub const RANKER_SEARCH: &str = "weka.attributeSelection.Ranker";

/// Separator for joining classpath entries
#[cfg(windows)]
pub const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const PATH_SEPARATOR: &str = ":";

/// Options that take a Weka option string as their value
const OPTION_STRING_FLAGS: [&str; 2] = ["-E", "-S"];

/// A program and its argument vector, passed to the OS without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Renders the command as a single shell line.
    ///
    /// Values of `-E` and `-S` are always double-quoted, as Weka's own
    /// documentation writes them; other arguments are quoted only when they
    /// contain whitespace or shell-special characters. Quoting stops at the
    /// `--` that starts the base classifier's options.
    pub fn render(&self) -> String {
        let mut out = shell_word(&self.program.to_string_lossy(), false);
        let mut previous: Option<&str> = None;
        let mut in_base_options = false;
        for arg in &self.args {
            let force =
                !in_base_options && previous.map_or(false, |p| OPTION_STRING_FLAGS.contains(&p));
            out.push(' ');
            out.push_str(&shell_word(arg, force));
            if arg == "--" {
                in_base_options = true;
            }
            previous = Some(arg);
        }
        out
    }
}

const SHELL_SPECIAL: [char; 14] =
    ['"', '\'', '\\', '$', '`', '&', '|', ';', '<', '>', '(', ')', '*', '?'];

fn shell_word(word: &str, force_quotes: bool) -> String {
    let needs_quotes = force_quotes
        || word.is_empty()
        || word
            .chars()
            .any(|c| c.is_whitespace() || SHELL_SPECIAL.contains(&c));
    if !needs_quotes {
        return word.to_string();
    }
    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('"');
    for c in word.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Splits a Weka option string into separate options.
///
/// Follows Weka's tokenizer: whitespace separates options, a double-quoted
/// group is one option with `\"` and `\\` unescaped inside it.
///
/// # Example
/// ```
/// use attrsweep::evaluator::split_options;
///
/// assert_eq!(
///     split_options(r#"weka.classifiers.functions.SMO -K "weka.classifiers.functions.supportVector.PolyKernel -E 1.0""#),
///     vec![
///         "weka.classifiers.functions.SMO",
///         "-K",
///         "weka.classifiers.functions.supportVector.PolyKernel -E 1.0",
///     ]
/// );
/// ```
pub fn split_options(options: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut chars = options.chars().peekable();
    loop {
        while chars.peek().map_or(false, |c| c.is_whitespace()) {
            chars.next();
        }
        let Some(&first) = chars.peek() else { break };
        let mut token = String::new();
        if first == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.peek() {
                        Some(&next) if next == '"' || next == '\\' => {
                            token.push(next);
                            chars.next();
                        }
                        _ => token.push(c),
                    },
                    '"' => break,
                    _ => token.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        result.push(token);
    }
    result
}

/// Builds the Weka command line for one configuration.
///
/// The argument order is fixed: classpath, meta classifier, data file, folds,
/// evaluator (`-E`), ranker search limited to the configuration's attribute
/// count (`-S`), base classifier (`-W`) and, after `--`, the base
/// classifier's own options.
pub fn build_command(
    java: &Path,
    config: &ExperimentConfig,
    data_file: &Path,
    search_path: &[PathBuf],
) -> CommandLine {
    let classpath = search_path
        .iter()
        .map(|entry| entry.to_string_lossy())
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR);

    let mut args = vec![
        "-classpath".to_string(),
        classpath,
        SUBCOMMAND.to_string(),
        "-t".to_string(),
        data_file.to_string_lossy().into_owned(),
        "-x".to_string(),
        CROSS_VALIDATION_FOLDS.to_string(),
        "-E".to_string(),
        config.ranker.invocation_args.trim().to_string(),
        "-S".to_string(),
        format!("{} -T -1.0 -N {}", RANKER_SEARCH, config.top_attribute_count),
    ];

    let mut classifier = split_options(&config.classifier.invocation_args).into_iter();
    if let Some(class_name) = classifier.next() {
        args.push("-W".to_string());
        args.push(class_name);
    }
    let base_options: Vec<String> = classifier.collect();
    if !base_options.is_empty() {
        args.push("--".to_string());
        args.extend(base_options);
    }

    CommandLine {
        program: java.to_path_buf(),
        args,
    }
}

/// What one external process run left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationOutcome {
    pub exit_succeeded: bool,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a command to completion and captures its output.
///
/// An `Err` means the process could not be started at all. A process that
/// started and exited non-zero is still an `Ok` outcome. Dropping the returned
/// future must stop the process.
pub trait ProcessRunner: Send + Sync + 'static {
    fn run(
        &self,
        command: &CommandLine,
    ) -> impl Future<Output = io::Result<EvaluationOutcome>> + Send;
}

/// Spawns real processes through tokio, killing them if the run is abandoned.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    fn run(
        &self,
        command: &CommandLine,
    ) -> impl Future<Output = io::Result<EvaluationOutcome>> + Send {
        let mut process = tokio::process::Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        async move {
            let output = process.output().await?;
            Ok(EvaluationOutcome {
                exit_succeeded: output.status.success(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

/// Evaluates experiment configurations with one Weka process each.
#[derive(Debug, Clone)]
pub struct Evaluator<R = TokioProcessRunner> {
    java: PathBuf,
    runner: R,
}

impl Evaluator<TokioProcessRunner> {
    /// Creates an evaluator that spawns `java` directly
    pub fn with_java(java: impl Into<PathBuf>) -> Self {
        Self::new(java, TokioProcessRunner)
    }
}

impl<R: ProcessRunner> Evaluator<R> {
    pub fn new(java: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            java: java.into(),
            runner,
        }
    }

    pub fn command(
        &self,
        config: &ExperimentConfig,
        data_file: &Path,
        search_path: &[PathBuf],
    ) -> CommandLine {
        build_command(&self.java, config, data_file, search_path)
    }

    /// Runs Weka once for `config`.
    ///
    /// # Errors
    /// `ExternalFailure::Spawn` when the process could not be started. A
    /// non-zero exit is reported through the outcome, not as an error.
    pub async fn evaluate(
        &self,
        config: &ExperimentConfig,
        data_file: &Path,
        search_path: &[PathBuf],
    ) -> Result<EvaluationOutcome, ExternalFailure> {
        let command = self.command(config, data_file, search_path);
        debug!("Running {}", command.render());
        self.runner.run(&command).await.map_err(|e| ExternalFailure::Spawn {
            program: command.program.to_string_lossy().into_owned(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Classifier, Ranker};

    const NAIVE_BAYES: &str = "weka.classifiers.bayes.NaiveBayes";
    const GAIN_RATIO: &str = "weka.attributeSelection.GainRatioAttributeEval";

    fn config(classifier: &str, ranker: &str, top: u32) -> ExperimentConfig {
        ExperimentConfig {
            classifier: Classifier::new("c", classifier),
            ranker: Ranker::new("r", ranker),
            top_attribute_count: top,
        }
    }

    #[test]
    fn test_render_matches_weka_cli_form() {
        let command = build_command(
            Path::new("/usr/bin/java"),
            &config(NAIVE_BAYES, GAIN_RATIO, 5),
            Path::new("/data/Lymphoma95x4023.arff"),
            &[PathBuf::from("/opt/weka/weka.jar")],
        );
        assert_eq!(
            command.render(),
            "/usr/bin/java -classpath /opt/weka/weka.jar weka.classifiers.meta.AttributeSelectedClassifier \
             -t /data/Lymphoma95x4023.arff -x 10 -E \"weka.attributeSelection.GainRatioAttributeEval\" \
             -S \"weka.attributeSelection.Ranker -T -1.0 -N 5\" -W weka.classifiers.bayes.NaiveBayes"
        );
    }

    #[test]
    fn test_base_classifier_options_follow_separator() {
        let command = build_command(
            Path::new("java"),
            &config(
                "weka.classifiers.trees.J48 -C 0.25 -M 2",
                "weka.attributeSelection.InfoGainAttributeEval",
                10,
            ),
            Path::new("d.arff"),
            &[PathBuf::from("weka.jar")],
        );
        let tail: Vec<&str> = command.args.iter().skip(11).map(String::as_str).collect();
        assert_eq!(tail, vec!["-W", "weka.classifiers.trees.J48", "--", "-C", "0.25", "-M", "2"]);
        assert!(command.render().ends_with("-W weka.classifiers.trees.J48 -- -C 0.25 -M 2"));
    }

    #[test]
    fn test_nested_quotes_in_evaluator_are_escaped() {
        let ranker =
            r#"weka.attributeSelection.ClassifierAttributeEval -B weka.classifiers.rules.ZeroR -S "x y""#;
        let command = build_command(
            Path::new("java"),
            &config(NAIVE_BAYES, ranker, 3),
            Path::new("d.arff"),
            &[],
        );
        assert_eq!(command.args[8], ranker);
        let quoted = r#"-E "weka.attributeSelection.ClassifierAttributeEval -B weka.classifiers.rules.ZeroR -S \"x y\"""#;
        assert!(command.render().contains(quoted));
    }

    #[test]
    fn test_split_options_escapes() {
        assert_eq!(split_options(r#"a "b \"c\" \\ d" e"#), vec!["a", r#"b "c" \ d"#, "e"]);
        assert!(split_options("   ").is_empty());
        assert_eq!(split_options("\"unterminated value"), vec!["unterminated value"]);
    }

    #[test]
    fn test_classpath_join() {
        let command = build_command(
            Path::new("java"),
            &config(NAIVE_BAYES, GAIN_RATIO, 5),
            Path::new("d.arff"),
            &[PathBuf::from("a.jar"), PathBuf::from("b.jar")],
        );
        assert_eq!(command.args[1], format!("a.jar{}b.jar", PATH_SEPARATOR));
    }
}
