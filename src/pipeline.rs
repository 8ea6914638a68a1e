//! Headline decision pipeline: non-political gate → political gate → bias model.
//!
//! Construction is the one-time initialization step. [`PipelineOrchestrator::initialize`]
//! either returns a ready pipeline or fails with the load error; there is no
//! half-initialized pipeline that could answer with gate-only guesses. A ready
//! pipeline is immutable and every [`PipelineOrchestrator::evaluate`] call is independent.
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classification::{BiasLabel, Gates, LexiconError, LexiconSet, Phrase};
use crate::model::{BiasClassifier, Confidences, ModelBackend, ModelError, ModelSettings};
use crate::observability::metrics::Metrics;

/// Which stage produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Non-political topic keyword found; forced Neutral.
    NonPolitical,
    /// No political keyword found; forced Neutral.
    PoliticalUnbiased,
    /// Label chosen by the bias model.
    Model,
}

impl DecisionReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NonPolitical => "non_political",
            Self::PoliticalUnbiased => "political_unbiased",
            Self::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: BiasLabel,
    /// Present only when `reason` is [`DecisionReason::Model`].
    pub confidences: Option<Confidences>,
    pub reason: DecisionReason,
    /// The lexicon phrase that decided the routing: the non-political hit, or the
    /// political hit that sent the headline to the model.
    pub matched_keyword: Option<Phrase>,
}

impl ClassificationResult {
    fn gated(reason: DecisionReason, matched_keyword: Option<Phrase>) -> Self {
        Self {
            label: BiasLabel::Neutral,
            confidences: None,
            reason,
            matched_keyword,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("please enter a headline")]
    InvalidInput,
    #[error("bias model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),
    #[error("lexicon failed to load: {0}")]
    LexiconLoad(#[from] LexiconError),
}

#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    gates: Gates,
    classifier: BiasClassifier,
    metrics: Option<Arc<Metrics>>,
}

impl PipelineOrchestrator {
    #[must_use]
    pub fn new(gates: Gates, classifier: BiasClassifier) -> Self {
        Self {
            gates,
            classifier,
            metrics: None,
        }
    }

    /// Compiles the lexicons and loads the model.
    ///
    /// # Errors
    /// Returns [`PipelineError::LexiconLoad`] or [`PipelineError::ModelUnavailable`];
    /// both are fatal for the process.
    pub fn initialize(
        lexicons: &LexiconSet,
        model: &ModelSettings,
    ) -> Result<Self, PipelineError> {
        let gates = Gates::compile(lexicons)?;
        let classifier = BiasClassifier::load(model)?;
        info!(
            backend = %classifier.backend(),
            non_political_phrases = lexicons.non_political().len(),
            political_phrases = lexicons.political().len(),
            "headline pipeline ready"
        );
        Ok(Self::new(gates, classifier))
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn backend(&self) -> ModelBackend {
        self.classifier.backend()
    }

    /// Classifies one headline. Each stage runs at most once and the first gate
    /// that fires decides the result.
    ///
    /// # Errors
    /// [`PipelineError::InvalidInput`] for empty or whitespace-only input;
    /// [`PipelineError::ModelUnavailable`] when inference fails.
    pub fn evaluate(&self, headline: &str) -> Result<ClassificationResult, PipelineError> {
        let headline = headline.trim();
        if headline.is_empty() {
            if let Some(metrics) = &self.metrics {
                metrics.invalid_inputs.inc();
            }
            return Err(PipelineError::InvalidInput);
        }

        let result = self.route(headline);
        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(result) => metrics.record_result(result.reason, result.label),
                Err(_) => metrics.model_failures.inc(),
            }
        }
        result
    }

    fn route(&self, headline: &str) -> Result<ClassificationResult, PipelineError> {
        if let Some(hit) = self.gates.non_political.hit(headline) {
            debug!(phrase = %hit.text, topic = %hit.topic, "non-political gate fired");
            return Ok(ClassificationResult::gated(
                DecisionReason::NonPolitical,
                Some(hit.clone()),
            ));
        }

        let Some(political_hit) = self.gates.political.hit(headline) else {
            debug!("no political vocabulary; skipping model");
            return Ok(ClassificationResult::gated(
                DecisionReason::PoliticalUnbiased,
                None,
            ));
        };

        let started = Instant::now();
        let prediction = self.classifier.predict(headline).inspect_err(|error| {
            warn!(%error, backend = %self.classifier.backend(), "bias model inference failed");
        })?;
        if let Some(metrics) = &self.metrics {
            metrics
                .inference_duration
                .observe(started.elapsed().as_secs_f64());
        }
        debug!(
            label = %prediction.label,
            phrase = %political_hit.text,
            "bias model decided"
        );

        Ok(ClassificationResult {
            label: prediction.label,
            confidences: Some(prediction.confidences),
            reason: DecisionReason::Model,
            matched_keyword: Some(political_hit.clone()),
        })
    }
}
