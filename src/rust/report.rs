//! Extraction of metrics and ranked attributes from Weka's text report.
//!
//! The report is treated as a fixed wire format. Two regions matter:
//!
//! ```text
//! === Attribute Selection on all input data ===
//! ...
//! Ranked attributes:
//!  0.6093   4023 GENE3330X
//!  0.5519   1195 GENE1719X
//!
//! Selected attributes: 4023,1195 : 2
//! ...
//! === Stratified cross-validation ===
//! ...
//!                  TP Rate  FP Rate  Precision  Recall   F-Measure  MCC      ROC Area  PRC Area  Class
//!                  0,957    0,040    0,957      0,957    0,957      0,917    0,989     0,990     ACL
//!                  0,960    0,043    0,960      0,960    0,960      0,917    0,989     0,987     nonACL
//! ...
//! === Confusion Matrix ===
//! ```
//!
//! Statistic values are rebuilt from their digit groups rather than parsed as
//! decimals, so locale separators and column padding do not matter.

pub const CROSS_VALIDATION_MARKER: &str = "=== Stratified cross-validation ===";
pub const CONFUSION_MATRIX_MARKER: &str = "=== Confusion Matrix ===";
pub const RANKED_ATTRIBUTES_HEADER: &str = "Ranked attributes:";

/// Metrics scraped from one report. A field is `None` when the report did
/// not contain it, which is distinct from a reported `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    /// FP rate of the positive class
    pub false_positive_rate: Option<f64>,
    /// FP rate of the negative class, i.e. the FN rate of the positive class
    pub false_negative_rate: Option<f64>,
    /// ROC area of the positive class
    pub roc_area: Option<f64>,
}

impl Metrics {
    pub fn is_empty(&self) -> bool {
        self.false_positive_rate.is_none()
            && self.false_negative_rate.is_none()
            && self.roc_area.is_none()
    }
}

/// The class labels as they appear at the end of the per-class lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels {
    pub positive: String,
    pub negative: String,
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self {
            positive: "ACL".to_string(),
            negative: "nonACL".to_string(),
        }
    }
}

impl ClassLabels {
    pub fn new(positive: impl Into<String>, negative: impl Into<String>) -> Self {
        Self {
            positive: positive.into(),
            negative: negative.into(),
        }
    }
}

/// Positions of the wanted statistics among the values [`parse_stat_line`]
/// returns for a per-class line.
///
/// The default matches the Weka 3.7+ "Detailed Accuracy By Class" table
/// (TP Rate, FP Rate, Precision, Recall, F-Measure, MCC, ROC Area, PRC Area).
/// Older releases print no MCC column; use [`ColumnLayout::legacy`] for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub false_positive_rate: usize,
    pub roc_area: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::new(1, 6)
    }
}

impl ColumnLayout {
    pub const fn new(false_positive_rate: usize, roc_area: usize) -> Self {
        Self {
            false_positive_rate,
            roc_area,
        }
    }

    /// Weka 3.6 and earlier: TP Rate, FP Rate, Precision, Recall, F-Measure, ROC Area
    pub const fn legacy() -> Self {
        Self::new(1, 5)
    }
}

/// Splits a per-class statistics line into its values.
///
/// Every value is printed as two digit groups around a separator, so
/// consecutive digit runs are paired and joined with a `.`; whatever sits
/// between two runs is ignored. A trailing run without a partner is split
/// before its last digit when it has at least two digits, and dropped
/// otherwise.
///
/// # Example
/// ```
/// use attrsweep::report::parse_stat_line;
///
/// assert_eq!(parse_stat_line("  0,957   0,040   ACL"), vec![0.957, 0.04]);
/// ```
pub fn parse_stat_line(line: &str) -> Vec<f64> {
    let runs = digit_runs(line);
    let mut values = Vec::with_capacity(runs.len() / 2 + 1);
    let mut i = 0;
    while i < runs.len() {
        let (integer, fraction) = if i + 1 < runs.len() {
            let pair = (runs[i], runs[i + 1]);
            i += 2;
            pair
        } else {
            let run = runs[i];
            i += 1;
            if run.len() < 2 {
                break;
            }
            run.split_at(run.len() - 1)
        };
        if let Ok(value) = format!("{}.{}", integer, fraction).parse::<f64>() {
            values.push(value);
        }
    }
    values
}

fn digit_runs(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut runs = Vec::new();
    let mut start = None;
    for (pos, byte) in bytes.iter().enumerate() {
        match (byte.is_ascii_digit(), start) {
            (true, None) => start = Some(pos),
            (false, Some(begin)) => {
                runs.push(&line[begin..pos]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        runs.push(&line[begin..]);
    }
    runs
}

/// Returns the cross-validation section of a report, from the last
/// cross-validation marker up to the confusion matrix. Without a marker the
/// whole report is returned.
pub fn cross_validation_window(report: &str) -> &str {
    let start = report
        .rfind(CROSS_VALIDATION_MARKER)
        .map(|pos| pos + CROSS_VALIDATION_MARKER.len())
        .unwrap_or(0);
    let tail = &report[start..];
    match tail.find(CONFUSION_MATRIX_MARKER) {
        Some(end) => &tail[..end],
        None => tail,
    }
}

/// Reads the attribute names following the `Ranked attributes:` header.
///
/// At most `limit` lines are read and the section ends early at a blank line.
/// The name is the last whitespace-separated token of each line. A report
/// without the header yields an empty list.
pub fn extract_ranked_attributes(report: &str, limit: usize) -> Vec<String> {
    let mut lines = report.lines();
    if !lines.any(|line| line.contains(RANKED_ATTRIBUTES_HEADER)) {
        return Vec::new();
    }
    lines
        .take(limit)
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_whitespace().last())
        .map(str::to_string)
        .collect()
}

/// Extracts metrics using the default labels and column layout
pub fn extract_metrics(report: &str) -> Metrics {
    ReportParser::default().extract_metrics(report)
}

/// Report parser configured for one dataset's class labels and one Weka
/// release's column layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportParser {
    labels: ClassLabels,
    layout: ColumnLayout,
}

impl ReportParser {
    pub fn new(labels: ClassLabels, layout: ColumnLayout) -> Self {
        Self { labels, layout }
    }

    /// Extracts the positive-class FP rate and ROC area and the negative-class
    /// FP rate from the cross-validation section.
    ///
    /// Labels are matched with a leading space so that `ACL` does not match
    /// inside `nonACL`. When a label appears on several lines the last one wins.
    /// Lines that are too short for a column leave that field `None`.
    pub fn extract_metrics(&self, report: &str) -> Metrics {
        let positive = format!(" {}", self.labels.positive);
        let negative = format!(" {}", self.labels.negative);
        let mut metrics = Metrics::default();

        for line in cross_validation_window(report).lines() {
            if line.contains(&positive) {
                let values = parse_stat_line(line);
                if let Some(&fpr) = values.get(self.layout.false_positive_rate) {
                    metrics.false_positive_rate = Some(fpr);
                }
                if let Some(&roc) = values.get(self.layout.roc_area) {
                    metrics.roc_area = Some(roc);
                }
            }
            if line.contains(&negative) {
                let values = parse_stat_line(line);
                if let Some(&fnr) = values.get(self.layout.false_positive_rate) {
                    metrics.false_negative_rate = Some(fnr);
                }
            }
        }
        metrics
    }

    pub fn extract_ranked_attributes(&self, report: &str, limit: usize) -> Vec<String> {
        extract_ranked_attributes(report, limit)
    }
}
