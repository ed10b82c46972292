use std::env;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Result, SweepError};
use crate::evaluator::{build_command, PATH_SEPARATOR};
use crate::experiment::ExperimentConfig;
use crate::report::{ClassLabels, ColumnLayout};
use crate::runner::RunnerConfig;

/// Application bundle layout of the Weka macOS installer
const MACOS_APP_DIR: &str = "/Applications/weka-3.9.6.app";

/// Where the Java runtime and the Weka classes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub java: PathBuf,
    /// Classpath entries, normally just `weka.jar`
    pub search_path: Vec<PathBuf>,
}

impl Default for ToolConfig {
    /// Resolves the install from `JAVA_HOME` and `WEKA_HOME`, falling back to
    /// the macOS application bundle for whichever is unset.
    fn default() -> Self {
        Self::resolve(
            env::var_os("JAVA_HOME").map(PathBuf::from),
            env::var_os("WEKA_HOME").map(PathBuf::from),
        )
    }
}

impl ToolConfig {
    pub fn new(java: impl Into<PathBuf>, search_path: Vec<PathBuf>) -> Self {
        Self {
            java: java.into(),
            search_path,
        }
    }

    pub fn resolve(java_home: Option<PathBuf>, weka_home: Option<PathBuf>) -> Self {
        let app_dir = Path::new(MACOS_APP_DIR);
        let java = match java_home {
            Some(home) => home.join("bin").join("java"),
            None => app_dir.join("Contents/runtime/Contents/Home/bin/java"),
        };
        let weka_jar = match weka_home {
            Some(home) => home.join("weka.jar"),
            None => app_dir.join("Contents/app/weka.jar"),
        };
        Self::new(java, vec![weka_jar])
    }

    /// Checks that the java executable and every classpath entry exist
    pub fn validate(&self) -> Result<()> {
        info!("Checking Java runtime at {:?}", self.java);
        if !self.java.exists() {
            return Err(SweepError::MissingPath {
                what: "Java executable",
                path: self.java.clone(),
            });
        }
        if self.search_path.is_empty() {
            return Err(SweepError::InvalidInput(
                "Classpath needs at least the Weka JAR file".into(),
            ));
        }
        for entry in &self.search_path {
            info!("Checking classpath entry {:?}", entry);
            if !entry.exists() {
                return Err(SweepError::MissingPath {
                    what: "Weka JAR file",
                    path: entry.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Everything a sweep needs besides the configuration space itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub tool: ToolConfig,
    /// ARFF file every experiment is evaluated on
    pub data_file: PathBuf,
    pub runner: RunnerConfig,
    pub labels: ClassLabels,
    pub layout: ColumnLayout,
}

impl SweepConfig {
    pub fn new(tool: ToolConfig, data_file: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            data_file: data_file.into(),
            runner: RunnerConfig::default(),
            labels: ClassLabels::default(),
            layout: ColumnLayout::default(),
        }
    }

    /// Validates every setting once, before any experiment is launched
    pub fn validate(&self) -> Result<()> {
        self.tool.validate()?;
        info!("Checking data file {:?}", self.data_file);
        if !self.data_file.is_file() {
            return Err(SweepError::MissingPath {
                what: "Data file",
                path: self.data_file.clone(),
            });
        }
        if self.labels.positive.trim().is_empty() || self.labels.negative.trim().is_empty() {
            return Err(SweepError::InvalidInput("Class labels cannot be empty".into()));
        }
        if self.labels.positive == self.labels.negative {
            return Err(SweepError::InvalidInput(format!(
                "Positive and negative class are both '{}'",
                self.labels.positive
            )));
        }
        self.runner.validate()
    }

    /// Human-readable summary of the sweep, including every command line
    /// that would be run
    pub fn describe(&self, configs: &[ExperimentConfig]) -> String {
        let mut out = String::new();
        let classpath = self
            .tool
            .search_path
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR);
        let _ = writeln!(out, "Java:        {}", self.tool.java.display());
        let _ = writeln!(out, "Classpath:   {}", classpath);
        let _ = writeln!(out, "Data file:   {}", self.data_file.display());
        let _ = writeln!(
            out,
            "Classes:     {} (positive) / {} (negative)",
            self.labels.positive, self.labels.negative
        );
        let _ = writeln!(
            out,
            "Parallelism: {}",
            self.runner
                .max_parallel
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
        );
        if let Some(timeout) = self.runner.task_timeout {
            let _ = writeln!(out, "Timeout:     {:?} per experiment", timeout);
        }
        let _ = writeln!(out, "Experiments: {}", configs.len());
        for (id, config) in configs.iter().enumerate() {
            let command =
                build_command(&self.tool.java, config, &self.data_file, &self.tool.search_path);
            let _ = writeln!(out, "  [{}] {}", id, config.label());
            let _ = writeln!(out, "      {}", command.render());
        }
        out
    }
}
