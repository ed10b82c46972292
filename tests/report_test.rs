mod common;

use attrsweep::report::{
    cross_validation_window, extract_metrics, extract_ranked_attributes, parse_stat_line,
    CONFUSION_MATRIX_MARKER, CROSS_VALIDATION_MARKER,
};
use attrsweep::{ClassLabels, ColumnLayout, Metrics, ReportParser};
use common::REPORT;

#[test]
fn test_weka_report_metrics() {
    let metrics = extract_metrics(REPORT);
    assert_eq!(metrics.false_positive_rate, Some(0.039));
    assert_eq!(metrics.roc_area, Some(0.985));
    assert_eq!(metrics.false_negative_rate, Some(0.045));
}

#[test]
fn test_weka_report_ranked_attributes() {
    assert_eq!(
        extract_ranked_attributes(REPORT, 5),
        vec!["GENE3330X", "GENE1719X", "GENE2177X", "GENE3256X", "GENE1622X"]
    );
    assert_eq!(extract_ranked_attributes(REPORT, 2), vec!["GENE3330X", "GENE1719X"]);
    // the ranked block ends before "Selected attributes:"
    assert_eq!(extract_ranked_attributes(REPORT, 50).len(), 5);
}

#[test]
fn test_window_excludes_model_and_confusion_matrix() {
    let window = cross_validation_window(REPORT);
    assert!(window.contains("Detailed Accuracy By Class"));
    assert!(!window.contains("Naive Bayes Classifier"));
    assert!(!window.contains("classified as"));
}

#[test]
fn test_leading_digit_groups() {
    let report = format!(
        "{}\n  0.100   0.950   ...   ACL\n  0.050   ...   nonACL\n{}\n",
        CROSS_VALIDATION_MARKER, CONFUSION_MATRIX_MARKER
    );
    let parser = ReportParser::new(ClassLabels::default(), ColumnLayout::new(0, 1));
    let metrics = parser.extract_metrics(&report);
    assert_eq!(metrics.false_positive_rate, Some(0.100));
    assert_eq!(metrics.roc_area, Some(0.950));
    assert_eq!(metrics.false_negative_rate, Some(0.050));
}

#[test]
fn test_no_cross_validation_marker() {
    let report = "Exception in thread \"main\" java.lang.OutOfMemoryError: Java heap space\n";
    assert_eq!(extract_metrics(report), Metrics::default());
    assert!(extract_metrics(report).is_empty());
    assert!(extract_metrics("").is_empty());
}

#[test]
fn test_marker_absent_scans_whole_report() {
    let report = " 0.9 0.2 0.8 0.9 0.85 0.7 0.93 0.9 ACL\n";
    let metrics = extract_metrics(report);
    assert_eq!(metrics.false_positive_rate, Some(0.2));
    assert_eq!(metrics.roc_area, Some(0.93));
}

#[test]
fn test_positive_label_does_not_match_negative_line() {
    let report = format!(
        "{}\n 0.9 0.3 0.8 0.9 0.85 0.7 0.91 0.9 nonACL\n",
        CROSS_VALIDATION_MARKER
    );
    let metrics = extract_metrics(&report);
    assert_eq!(metrics.false_positive_rate, None);
    assert_eq!(metrics.roc_area, None);
    assert_eq!(metrics.false_negative_rate, Some(0.3));
}

#[test]
fn test_ranked_attributes_limit() {
    let report = "Ranked attributes:\n 0.9  1 attrA\n 0.8  2 attrB\n 0.7  3 attrC\n 0.6  4 attrD\n";
    assert_eq!(extract_ranked_attributes(report, 3), vec!["attrA", "attrB", "attrC"]);
    assert_eq!(extract_ranked_attributes(report, 5), vec!["attrA", "attrB", "attrC", "attrD"]);
}

#[test]
fn test_ranked_attributes_without_header() {
    assert!(extract_ranked_attributes("attrA\nattrB\n", 2).is_empty());
}

#[test]
fn test_stat_line_with_comma_decimals() {
    assert_eq!(
        parse_stat_line("                 0,955    0,039    0,955      0,955    0,955      0,915    0,985     0,979     ACL"),
        vec![0.955, 0.039, 0.955, 0.955, 0.955, 0.915, 0.985, 0.979]
    );
}

#[test]
fn test_legacy_layout() {
    let report = format!(
        "{}\n                 0.955    0.039    0.955      0.955    0.955      0.985    ACL\n",
        CROSS_VALIDATION_MARKER
    );
    let parser = ReportParser::new(ClassLabels::default(), ColumnLayout::legacy());
    assert_eq!(parser.extract_metrics(&report).roc_area, Some(0.985));
    assert_eq!(extract_metrics(&report).roc_area, None);
}
