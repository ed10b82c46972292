use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use super::model::{Classifier, Ranker};
use super::space::ConfigurationSpace;
use crate::error::Result;

/// The sweep definition as stored on disk.
///
/// Lists rather than maps so the file order is the sweep order:
///
/// ```json
/// {
///   "classifiers": [{"name": "NaiveBayes", "args": "weka.classifiers.bayes.NaiveBayes"}],
///   "rankers": [{"name": "GainRatio", "args": "weka.attributeSelection.GainRatioAttributeEval"}],
///   "top_counts": [5, 10]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExperimentPlan {
    pub classifiers: Vec<Classifier>,
    pub rankers: Vec<Ranker>,
    pub top_counts: Vec<u32>,
}

impl Default for ExperimentPlan {
    fn default() -> Self {
        Self {
            classifiers: vec![
                Classifier::new("NaiveBayes", "weka.classifiers.bayes.NaiveBayes"),
                Classifier::new("J48", "weka.classifiers.trees.J48 -C 0.25 -M 2"),
                Classifier::new("IBk", "weka.classifiers.lazy.IBk -K 3"),
                Classifier::new("SMO", "weka.classifiers.functions.SMO"),
            ],
            rankers: vec![
                Ranker::new("GainRatio", "weka.attributeSelection.GainRatioAttributeEval"),
                Ranker::new("InfoGain", "weka.attributeSelection.InfoGainAttributeEval"),
                Ranker::new(
                    "ReliefF",
                    "weka.attributeSelection.ReliefFAttributeEval -M -1 -D 1 -K 10",
                ),
                Ranker::new(
                    "SymmetricalUncert",
                    "weka.attributeSelection.SymmetricalUncertAttributeEval",
                ),
            ],
            top_counts: vec![5, 10, 20],
        }
    }
}

impl ExperimentPlan {
    /// Reads a plan from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading experiment plan from {:?}", path);
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Feeds the plan through the validating builder
    pub fn space(&self) -> Result<ConfigurationSpace> {
        ConfigurationSpace::from_parts(&self.classifiers, &self.rankers, &self.top_counts)
    }
}
