use log::{debug, info};

use super::model::{Classifier, ExperimentConfig, Ranker};
use crate::error::{Result, SweepError};

/// Builds the ordered configuration space for a sweep.
///
/// Classifiers and rankers keep their insertion order and names must be unique
/// within each set. The product is generated classifier-major, then ranker,
/// then top count, so the position of every configuration (its experiment id)
/// is reproducible for the same inputs.
///
/// # Example
/// ```
/// use attrsweep::{Classifier, ConfigurationSpace, Ranker};
///
/// let configs = ConfigurationSpace::builder()
///     .add_classifier(Classifier::new("NaiveBayes", "weka.classifiers.bayes.NaiveBayes"))?
///     .add_ranker(Ranker::new("GainRatio", "weka.attributeSelection.GainRatioAttributeEval"))?
///     .with_top_counts(vec![5, 10])
///     .build()?;
/// assert_eq!(configs.len(), 2);
/// # Ok::<(), attrsweep::SweepError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct ConfigurationSpace {
    classifiers: Vec<Classifier>,
    rankers: Vec<Ranker>,
    top_counts: Vec<u32>,
}

impl ConfigurationSpace {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Feeds every entry through the validating `add_*` methods
    pub fn from_parts(
        classifiers: &[Classifier],
        rankers: &[Ranker],
        top_counts: &[u32],
    ) -> Result<Self> {
        let mut space = Self::builder();
        for classifier in classifiers {
            space = space.add_classifier(classifier.clone())?;
        }
        for ranker in rankers {
            space = space.add_ranker(ranker.clone())?;
        }
        Ok(space.with_top_counts(top_counts.to_vec()))
    }

    /// Adds a classifier, rejecting an empty or already used name
    pub fn add_classifier(mut self, classifier: Classifier) -> Result<Self> {
        Self::validate_entry("classifier", &classifier.name, &classifier.invocation_args)?;
        if self.classifiers.iter().any(|c| c.name == classifier.name) {
            return Err(SweepError::InvalidInput(format!(
                "Classifier '{}' is already part of the sweep",
                classifier.name
            )));
        }
        self.classifiers.push(classifier);
        Ok(self)
    }

    /// Adds a ranker, rejecting an empty or already used name
    pub fn add_ranker(mut self, ranker: Ranker) -> Result<Self> {
        Self::validate_entry("ranker", &ranker.name, &ranker.invocation_args)?;
        if self.rankers.iter().any(|r| r.name == ranker.name) {
            return Err(SweepError::InvalidInput(format!(
                "Ranker '{}' is already part of the sweep",
                ranker.name
            )));
        }
        self.rankers.push(ranker);
        Ok(self)
    }

    /// Sets the attribute counts; validated in [`ConfigurationSpace::build`]
    pub fn with_top_counts(mut self, top_counts: Vec<u32>) -> Self {
        self.top_counts = top_counts;
        self
    }

    /// Generates every configuration in sweep order.
    ///
    /// # Errors
    /// `InvalidInput` if there are no classifiers, no rankers, no top counts,
    /// or any top count is zero.
    pub fn build(&self) -> Result<Vec<ExperimentConfig>> {
        if self.classifiers.is_empty() {
            return Err(SweepError::InvalidInput("At least one classifier is required".into()));
        }
        if self.rankers.is_empty() {
            return Err(SweepError::InvalidInput("At least one ranker is required".into()));
        }
        if self.top_counts.is_empty() {
            return Err(SweepError::InvalidInput("At least one attribute count is required".into()));
        }
        if let Some(pos) = self.top_counts.iter().position(|&n| n == 0) {
            return Err(SweepError::InvalidInput(format!(
                "Attribute count {} must be positive",
                pos + 1
            )));
        }

        let mut configs = Vec::with_capacity(self.len());
        for classifier in &self.classifiers {
            for ranker in &self.rankers {
                for &top_attribute_count in &self.top_counts {
                    configs.push(ExperimentConfig {
                        classifier: classifier.clone(),
                        ranker: ranker.clone(),
                        top_attribute_count,
                    });
                }
            }
        }
        for (id, config) in configs.iter().enumerate() {
            debug!("Experiment {}: {}", id, config.label());
        }
        info!(
            "Configuration space: {} classifiers x {} rankers x {} attribute counts = {} experiments",
            self.classifiers.len(),
            self.rankers.len(),
            self.top_counts.len(),
            configs.len()
        );
        Ok(configs)
    }

    /// Number of configurations [`ConfigurationSpace::build`] will produce
    pub fn len(&self) -> usize {
        self.classifiers.len() * self.rankers.len() * self.top_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn classifiers(&self) -> &[Classifier] {
        &self.classifiers
    }

    pub fn rankers(&self) -> &[Ranker] {
        &self.rankers
    }

    pub fn top_counts(&self) -> &[u32] {
        &self.top_counts
    }

    fn validate_entry(kind: &str, name: &str, args: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(SweepError::InvalidInput(format!("{} name cannot be empty", kind)));
        }
        if args.trim().is_empty() {
            return Err(SweepError::InvalidInput(format!(
                "{} '{}' needs invocation arguments",
                kind, name
            )));
        }
        Ok(())
    }
}

/// Builds the configuration space from plain slices in one call.
pub fn build(
    classifiers: &[Classifier],
    rankers: &[Ranker],
    top_counts: &[u32],
) -> Result<Vec<ExperimentConfig>> {
    ConfigurationSpace::from_parts(classifiers, rankers, top_counts)?.build()
}
