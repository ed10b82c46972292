use serde::Deserialize;

/// A Weka classification algorithm and the option string Weka expects for it.
///
/// `invocation_args` starts with the fully qualified class name and may carry
/// the classifier's own options after it, e.g.
/// `weka.classifiers.functions.SMO -C 1.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Classifier {
    /// Short label used in logs and in the result table
    pub name: String,
    /// Class name plus options, as passed to Weka
    #[serde(rename = "args")]
    pub invocation_args: String,
}

impl Classifier {
    /// Creates a classifier reference
    ///
    /// # Example
    /// ```
    /// use attrsweep::Classifier;
    ///
    /// let nb = Classifier::new("NaiveBayes", "weka.classifiers.bayes.NaiveBayes");
    /// assert_eq!(nb.name, "NaiveBayes");
    /// ```
    pub fn new(name: impl Into<String>, invocation_args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            invocation_args: invocation_args.into(),
        }
    }
}

/// A Weka attribute evaluator used to rank features before classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Ranker {
    pub name: String,
    /// Evaluator class name plus options, passed verbatim as Weka's `-E` value
    #[serde(rename = "args")]
    pub invocation_args: String,
}

impl Ranker {
    pub fn new(name: impl Into<String>, invocation_args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            invocation_args: invocation_args.into(),
        }
    }
}

/// One point of the classifier x ranker x top-N product.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExperimentConfig {
    pub classifier: Classifier,
    pub ranker: Ranker,
    /// How many top-ranked attributes the classifier is trained on
    pub top_attribute_count: u32,
}

impl ExperimentConfig {
    /// A compact `classifier/ranker/N` label for logging
    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.classifier.name, self.ranker.name, self.top_attribute_count)
    }
}
