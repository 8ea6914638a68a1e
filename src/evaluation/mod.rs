//! Offline evaluation of the bias model and of the gated pipeline against a
//! labeled headline dataset.
pub mod dataset;
pub mod metrics;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::model::{BiasClassifier, ModelError};
use crate::pipeline::{PipelineError, PipelineOrchestrator};

pub use dataset::{Dataset, DatasetError, LabeledHeadline, load_dataset, read_dataset};
pub use metrics::{ClassMetrics, EvaluationReport, MetricsCalculator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Every sample goes straight to the bias model.
    Classifier,
    /// Samples run through both gates first.
    Gated,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub mode: EvaluationMode,
    pub report: EvaluationReport,
    /// How many samples each stage decided. Empty for [`EvaluationMode::Classifier`].
    pub decided_by: BTreeMap<&'static str, usize>,
}

/// Scores the bias model alone, as training-time evaluation does.
///
/// # Errors
/// Stops at the first inference failure.
pub fn evaluate_classifier(
    classifier: &BiasClassifier,
    samples: &[LabeledHeadline],
) -> Result<EvaluationSummary, ModelError> {
    let mut calculator = MetricsCalculator::new();
    for sample in samples {
        let prediction = classifier.predict(&sample.headline)?;
        calculator.push(sample.label, prediction.label);
    }
    let report = calculator.finalize();
    info!(
        total = report.total,
        accuracy = report.accuracy,
        macro_f1 = report.macro_f1,
        "classifier evaluation finished"
    );
    Ok(EvaluationSummary {
        mode: EvaluationMode::Classifier,
        report,
        decided_by: BTreeMap::new(),
    })
}

/// Scores the full gate → model pipeline.
///
/// # Errors
/// Stops at the first sample that fails with anything other than empty input;
/// samples that clean down to nothing are skipped.
pub fn evaluate_pipeline(
    pipeline: &PipelineOrchestrator,
    samples: &[LabeledHeadline],
) -> Result<EvaluationSummary, PipelineError> {
    let mut calculator = MetricsCalculator::new();
    let mut decided_by = BTreeMap::new();
    for sample in samples {
        let result = match pipeline.evaluate(&sample.headline) {
            Ok(result) => result,
            Err(PipelineError::InvalidInput) => continue,
            Err(error) => return Err(error),
        };
        *decided_by.entry(result.reason.as_str()).or_insert(0) += 1;
        calculator.push(sample.label, result.label);
    }
    let report = calculator.finalize();
    info!(
        total = report.total,
        accuracy = report.accuracy,
        macro_f1 = report.macro_f1,
        ?decided_by,
        "gated evaluation finished"
    );
    Ok(EvaluationSummary {
        mode: EvaluationMode::Gated,
        report,
        decided_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{BiasLabel, Gates, LexiconSet};
    use crate::model::testing::FixedModel;
    use std::sync::Arc;

    fn samples() -> Vec<LabeledHeadline> {
        [
            ("Supreme Court hears plea on new education policy", BiasLabel::Right),
            ("BJP and Congress clash over farm laws in Parliament", BiasLabel::Left),
            ("Monsoon arrives early in Kerala", BiasLabel::Neutral),
            ("Local bakery wins award for best bread in the city", BiasLabel::Neutral),
        ]
        .into_iter()
        .map(|(headline, label)| LabeledHeadline {
            headline: headline.to_string(),
            label,
        })
        .collect()
    }

    #[test]
    fn classifier_mode_sends_every_sample_to_the_model() {
        let model = Arc::new(FixedModel::new([0.0, 0.0, 3.0]));
        let classifier = BiasClassifier::new(model.clone());

        let summary = evaluate_classifier(&classifier, &samples()).unwrap();

        assert_eq!(model.calls(), 4);
        assert_eq!(summary.report.total, 4);
        assert!((summary.report.accuracy - 0.25).abs() < 1e-9);
        assert!(summary.decided_by.is_empty());
    }

    #[test]
    fn gated_mode_counts_deciding_stage() {
        let model = Arc::new(FixedModel::new([0.0, 0.0, 3.0]));
        let gates = Gates::compile(&LexiconSet::embedded().unwrap()).unwrap();
        let pipeline = PipelineOrchestrator::new(
            gates,
            BiasClassifier::new(model.clone()),
        );

        let summary = evaluate_pipeline(&pipeline, &samples()).unwrap();

        assert_eq!(model.calls(), 2);
        assert_eq!(summary.decided_by.get("model"), Some(&2));
        assert_eq!(summary.decided_by.get("non_political"), Some(&1));
        assert_eq!(summary.decided_by.get("political_unbiased"), Some(&1));
        // Right, wrong(Left gold), Neutral, Neutral
        assert!((summary.report.accuracy - 0.75).abs() < 1e-9);
    }
}
