use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Errors that stop a sweep before any experiment is launched.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// The configuration space or a configuration value is malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A path the sweep depends on does not exist
    #[error("{what} not found: {}", .path.display())]
    MissingPath {
        what: &'static str,
        path: PathBuf,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Plan file error: {0}")]
    Plan(#[from] serde_json::Error),
}

/// Why a single experiment produced no usable report.
///
/// These never abort a sweep; they are recorded against the experiment
/// that hit them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExternalFailure {
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },
    #[error("exited with {} and produced no metrics", exit_label(.exit_code))]
    NoUsableOutput { exit_code: Option<i32> },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("cancelled")]
    Cancelled,
    #[error("worker panicked")]
    Panicked,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages() {
        let failure = ExternalFailure::NoUsableOutput { exit_code: Some(1) };
        assert_eq!(failure.to_string(), "exited with status 1 and produced no metrics");

        let failure = ExternalFailure::NoUsableOutput { exit_code: None };
        assert_eq!(failure.to_string(), "exited with a signal and produced no metrics");

        let err = SweepError::MissingPath {
            what: "Weka JAR file",
            path: PathBuf::from("/opt/weka.jar"),
        };
        assert_eq!(err.to_string(), "Weka JAR file not found: /opt/weka.jar");
    }
}
