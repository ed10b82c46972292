use std::fs;
use std::path::Path;

use log::info;

use crate::error::Result;
use crate::runner::ResultSet;

/// Column names of the exported table, in order
pub const HEADER: [&str; 8] = [
    "ID",
    "Classifier",
    "Ranker",
    "AttributesNum",
    "Attributes",
    "FPR",
    "FNR",
    "ROCArea",
];

/// Cell value for a metric the report did not contain
pub const MISSING: &str = "NA";

/// Joins ranked attribute names inside the `Attributes` cell
pub const ATTRIBUTE_DELIMITER: &str = "|";

fn metric_cell(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

/// Converts a result set into a header row followed by one row per
/// experiment, in ascending id order.
pub fn to_rows(results: &ResultSet) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(results.len() + 1);
    rows.push(HEADER.iter().map(|h| h.to_string()).collect());
    for result in results {
        rows.push(vec![
            result.id.to_string(),
            result.config.classifier.name.clone(),
            result.config.ranker.name.clone(),
            result.config.top_attribute_count.to_string(),
            result.ranked_attributes.join(ATTRIBUTE_DELIMITER),
            metric_cell(result.metrics.false_positive_rate),
            metric_cell(result.metrics.false_negative_rate),
            metric_cell(result.metrics.roc_area),
        ]);
    }
    rows
}

fn csv_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Renders rows as comma-separated text, quoting cells that need it
pub fn to_csv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row.iter().map(|cell| csv_cell(cell)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// Writes the table for `results` to `path` as CSV
pub fn write_csv<P: AsRef<Path>>(path: P, results: &ResultSet) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_csv(&to_rows(results)))?;
    info!("Wrote {} results to {:?}", results.len(), path);
    Ok(())
}
