/// Prometheus metric definitions.
use prometheus::{
    Histogram, IntCounter, IntCounterVec, Registry, histogram_opts,
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry,
};
use std::sync::Arc;

use crate::classification::BiasLabel;
use crate::pipeline::DecisionReason;

/// Metric collector for the headline pipeline and its HTTP surface.
#[derive(Debug, Clone)]
pub struct Metrics {
    // counters
    pub headlines: IntCounterVec,
    pub predictions: IntCounterVec,
    pub invalid_inputs: IntCounter,
    pub model_failures: IntCounter,
    pub request_timeouts: IntCounter,

    // histograms
    pub inference_duration: Histogram,
    pub request_duration: Histogram,
}

impl Metrics {
    /// Registers every collector with `registry`.
    ///
    /// # Errors
    /// Returns an error if a metric with the same name is already registered.
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            headlines: register_int_counter_vec_with_registry!(
                "bias_headlines_total",
                "Headlines classified, by the stage that decided them",
                &["reason"],
                registry
            )?,
            predictions: register_int_counter_vec_with_registry!(
                "bias_predictions_total",
                "Final labels returned, by label",
                &["label"],
                registry
            )?,
            invalid_inputs: register_int_counter_with_registry!(
                "bias_invalid_inputs_total",
                "Requests rejected because the headline was empty",
                registry
            )?,
            model_failures: register_int_counter_with_registry!(
                "bias_model_failures_total",
                "Bias model inference failures",
                registry
            )?,
            request_timeouts: register_int_counter_with_registry!(
                "bias_request_timeouts_total",
                "Classification requests that exceeded the request timeout",
                registry
            )?,
            inference_duration: register_histogram_with_registry!(
                histogram_opts!(
                    "bias_inference_duration_seconds",
                    "Bias model forward pass latency",
                    vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
                ),
                registry
            )?,
            request_duration: register_histogram_with_registry!(
                histogram_opts!(
                    "bias_request_duration_seconds",
                    "End-to-end classify request latency",
                    vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
                ),
                registry
            )?,
        })
    }

    pub fn record_result(&self, reason: DecisionReason, label: BiasLabel) {
        self.headlines.with_label_values(&[reason.as_str()]).inc();
        self.predictions.with_label_values(&[label.as_str()]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_twice_on_one_registry_fails() {
        let registry = Arc::new(Registry::new());
        let _first = Metrics::new(Arc::clone(&registry)).expect("first registration");
        assert!(Metrics::new(registry).is_err());
    }

    #[test]
    fn record_result_counts_reason_and_label() {
        let metrics = Metrics::new(Arc::new(Registry::new())).unwrap();
        metrics.record_result(DecisionReason::PoliticalUnbiased, BiasLabel::Neutral);
        metrics.record_result(DecisionReason::PoliticalUnbiased, BiasLabel::Neutral);
        assert_eq!(
            metrics
                .headlines
                .with_label_values(&["political_unbiased"])
                .get(),
            2
        );
        assert_eq!(metrics.predictions.with_label_values(&["Neutral"]).get(), 2);
    }
}
