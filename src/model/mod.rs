//! Bias classifier: the model-backed third stage of the pipeline.
//!
//! Concrete runtimes implement [`BiasModel`] and only produce raw logits; the
//! softmax, arg-max and percentage handling live in [`BiasClassifier`] so that every
//! backend reports confidences the same way.
pub mod linear;
pub mod transformer;

use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::classification::{BiasLabel, LABEL_COUNT, LABEL_MAP};

pub use linear::LinearBiasModel;
pub use transformer::TransformerBiasModel;

/// Default truncation length for tokenized headlines.
pub const DEFAULT_MAX_TOKEN_LENGTH: usize = 64;

/// A loaded, read-only model that scores a headline against the three classes.
///
/// Output index `i` must correspond to `LABEL_MAP[i]`; implementations check this
/// against their artifact when they load.
pub trait BiasModel: Send + Sync + fmt::Debug {
    fn backend(&self) -> ModelBackend;

    /// Raw (unnormalized) class scores in `LABEL_MAP` order.
    ///
    /// # Errors
    /// Returns [`ModelError`] if tokenization or the forward pass fails.
    fn logits(&self, headline: &str) -> Result<[f32; LABEL_COUNT], ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    /// Fine-tuned BERT sequence classifier.
    Transformer,
    /// TF-IDF + logistic regression baseline.
    Linear,
}

impl ModelBackend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transformer => "transformer",
            Self::Linear => "linear",
        }
    }
}

impl fmt::Display for ModelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelBackend {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "transformer" | "bert" => Ok(Self::Transformer),
            "linear" | "tfidf" => Ok(Self::Linear),
            other => Err(ModelError::UnknownBackend(other.to_string())),
        }
    }
}

/// Where and how to load the model artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub backend: ModelBackend,
    /// Artifact directory (transformer) or weights JSON file (linear).
    pub model_path: PathBuf,
    /// Overrides `<model_path>/tokenizer.json` for the transformer backend.
    pub tokenizer_path: Option<PathBuf>,
    pub max_token_length: NonZeroUsize,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unknown model backend: {0}")]
    UnknownBackend(String),
    #[error("failed to read model artifact at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model artifact at {path}: {reason}")]
    Artifact { path: PathBuf, reason: String },
    #[error("label mapping mismatch: {0}")]
    LabelMapping(String),
    #[error("failed to load tokenizer from {path}: {reason}")]
    Tokenizer { path: PathBuf, reason: String },
    #[error("tokenization failed: {0}")]
    Tokenize(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model produced non-finite logits: {0:?}")]
    NonFinite([f32; LABEL_COUNT]),
}

/// Softmax-normalized class probabilities in `LABEL_MAP` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidences {
    probabilities: [f32; LABEL_COUNT],
}

impl Confidences {
    /// # Errors
    /// Returns [`ModelError::NonFinite`] if any logit is NaN or infinite.
    pub fn from_logits(logits: [f32; LABEL_COUNT]) -> Result<Self, ModelError> {
        if logits.iter().any(|value| !value.is_finite()) {
            return Err(ModelError::NonFinite(logits));
        }
        let max = logits
            .iter()
            .copied()
            .map(f64::from)
            .fold(f64::NEG_INFINITY, f64::max);
        let exps = logits.map(|value| (f64::from(value) - max).exp());
        let total: f64 = exps.iter().sum();
        #[allow(clippy::cast_possible_truncation)]
        let probabilities = exps.map(|value| (value / total) as f32);
        Ok(Self { probabilities })
    }

    #[must_use]
    pub fn probabilities(&self) -> [f32; LABEL_COUNT] {
        self.probabilities
    }

    #[must_use]
    pub fn probability(&self, label: BiasLabel) -> f32 {
        self.probabilities[label.index()]
    }

    /// Probability as a percentage rounded to two decimals.
    #[must_use]
    pub fn percentage(&self, label: BiasLabel) -> f64 {
        (f64::from(self.probability(label)) * 10_000.0).round() / 100.0
    }

    #[must_use]
    pub fn percentages(&self) -> [f64; LABEL_COUNT] {
        LABEL_MAP.map(|label| self.percentage(label))
    }

    /// Highest-probability label. On an exact tie the lowest index wins.
    #[must_use]
    pub fn top_label(&self) -> BiasLabel {
        let mut best = 0;
        for (index, probability) in self.probabilities.iter().enumerate().skip(1) {
            if *probability > self.probabilities[best] {
                best = index;
            }
        }
        LABEL_MAP[best]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: BiasLabel,
    pub confidences: Confidences,
}

/// Wraps a loaded [`BiasModel`] and turns logits into a labeled prediction.
#[derive(Debug, Clone)]
pub struct BiasClassifier {
    model: Arc<dyn BiasModel>,
}

impl BiasClassifier {
    #[must_use]
    pub fn new(model: Arc<dyn BiasModel>) -> Self {
        Self { model }
    }

    /// Loads the configured backend. Any failure here is fatal for the pipeline.
    ///
    /// # Errors
    /// Returns [`ModelError`] if the artifact, tokenizer, or label mapping is invalid.
    pub fn load(settings: &ModelSettings) -> Result<Self, ModelError> {
        info!(
            backend = %settings.backend,
            path = %settings.model_path.display(),
            max_token_length = settings.max_token_length.get(),
            "loading bias model"
        );
        let model: Arc<dyn BiasModel> = match settings.backend {
            ModelBackend::Transformer => Arc::new(TransformerBiasModel::load(settings)?),
            ModelBackend::Linear => Arc::new(LinearBiasModel::load(&settings.model_path)?),
        };
        Ok(Self::new(model))
    }

    #[must_use]
    pub fn backend(&self) -> ModelBackend {
        self.model.backend()
    }

    /// # Errors
    /// Propagates inference failures; never substitutes a default label.
    pub fn predict(&self, headline: &str) -> Result<Prediction, ModelError> {
        let logits = self.model.logits(headline)?;
        let confidences = Confidences::from_logits(logits)?;
        let label = confidences.top_label();
        debug!(backend = %self.backend(), %label, ?logits, "bias model prediction");
        Ok(Prediction { label, confidences })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{BrokenModel, FixedModel};
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case([2.0, 0.5, -1.0])]
    #[case([0.0, 0.0, 0.0])]
    #[case([80.0, -80.0, 10.0])]
    #[case([-3.5, -3.4, -3.6])]
    fn softmax_is_a_distribution(#[case] logits: [f32; LABEL_COUNT]) {
        let confidences = Confidences::from_logits(logits).expect("finite logits");
        let probabilities = confidences.probabilities();
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        let total: f32 = probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-3, "sum was {total}");
    }

    #[test]
    fn exact_ties_pick_the_lowest_index() {
        let all_equal = Confidences::from_logits([1.0, 1.0, 1.0]).unwrap();
        assert_eq!(all_equal.top_label(), BiasLabel::Left);
        let neutral_right = Confidences::from_logits([0.0, 2.0, 2.0]).unwrap();
        assert_eq!(neutral_right.top_label(), BiasLabel::Neutral);
    }

    #[test]
    fn percentages_have_two_decimals() {
        let confidences = Confidences::from_logits([0.0, 0.0, 0.0]).unwrap();
        assert_eq!(confidences.percentages(), [33.33, 33.33, 33.33]);
    }

    #[test]
    fn non_finite_logits_are_rejected() {
        let err = Confidences::from_logits([f32::NAN, 0.0, 1.0]).unwrap_err();
        assert!(matches!(err, ModelError::NonFinite(_)));
    }

    #[test]
    fn classifier_maps_argmax_through_label_map() {
        let classifier = BiasClassifier::new(Arc::new(FixedModel::new([-1.0, 0.2, 3.1])));
        let prediction = classifier.predict("anything").expect("prediction");
        assert_eq!(prediction.label, BiasLabel::Right);
        assert!(prediction.confidences.probability(BiasLabel::Right) > 0.8);
    }

    #[test]
    fn classifier_surfaces_model_errors() {
        let classifier = BiasClassifier::new(Arc::new(BrokenModel));
        assert!(matches!(
            classifier.predict("anything"),
            Err(ModelError::Inference(_))
        ));
    }

    #[test]
    fn backend_names_parse() {
        assert_eq!("BERT".parse::<ModelBackend>().unwrap(), ModelBackend::Transformer);
        assert_eq!("linear".parse::<ModelBackend>().unwrap(), ModelBackend::Linear);
        assert!("onnx".parse::<ModelBackend>().is_err());
    }
}
