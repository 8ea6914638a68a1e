use serde::Serialize;

use crate::classification::{BiasLabel, LABEL_COUNT, LABEL_MAP};

/// Precision, recall, and F1 for one label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: BiasLabel,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Aggregate classification metrics. Rows of `confusion_matrix` are gold labels, columns are
/// predictions, both in `LABEL_MAP` order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub weighted_f1: f64,
    pub per_class: Vec<ClassMetrics>,
    pub confusion_matrix: [[usize; LABEL_COUNT]; LABEL_COUNT],
}

/// Accumulates (gold, predicted) pairs into a confusion matrix.
#[derive(Debug, Default, Clone)]
pub struct MetricsCalculator {
    confusion: [[usize; LABEL_COUNT]; LABEL_COUNT],
}

impl MetricsCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, expected: BiasLabel, predicted: BiasLabel) {
        self.confusion[expected.index()][predicted.index()] += 1;
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.confusion.iter().flatten().sum()
    }

    /// Labels absent from both gold and predictions score 0 and still count
    /// toward the macro averages.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn finalize(&self) -> EvaluationReport {
        let total = self.total();
        let per_class: Vec<ClassMetrics> = LABEL_MAP
            .iter()
            .map(|&label| {
                let index = label.index();
                let true_positive = self.confusion[index][index];
                let support: usize = self.confusion[index].iter().sum();
                let predicted: usize = self.confusion.iter().map(|row| row[index]).sum();
                let precision = ratio(true_positive, predicted);
                let recall = ratio(true_positive, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let correct: usize = (0..LABEL_COUNT).map(|index| self.confusion[index][index]).sum();
        let classes = LABEL_COUNT as f64;
        let weighted_f1 = if total > 0 {
            per_class
                .iter()
                .map(|class| class.f1 * class.support as f64)
                .sum::<f64>()
                / total as f64
        } else {
            0.0
        };

        EvaluationReport {
            total,
            accuracy: ratio(correct, total),
            macro_precision: per_class.iter().map(|class| class.precision).sum::<f64>() / classes,
            macro_recall: per_class.iter().map(|class| class.recall).sum::<f64>() / classes,
            macro_f1: per_class.iter().map(|class| class.f1).sum::<f64>() / classes,
            weighted_f1,
            per_class,
            confusion_matrix: self.confusion,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BiasLabel::{Left, Neutral, Right};

    #[test]
    fn test_metrics_calculation() {
        let mut calculator = MetricsCalculator::new();
        // gold Left: 2 correct, 1 predicted Right
        calculator.push(Left, Left);
        calculator.push(Left, Left);
        calculator.push(Left, Right);
        // gold Neutral: 1 correct
        calculator.push(Neutral, Neutral);
        // gold Right: 1 correct, 1 predicted Neutral
        calculator.push(Right, Right);
        calculator.push(Right, Neutral);

        let report = calculator.finalize();

        assert_eq!(report.total, 6);
        assert_eq!(report.confusion_matrix, [[2, 0, 1], [0, 1, 0], [0, 1, 1]]);
        assert!((report.accuracy - 4.0 / 6.0).abs() < 1e-9);

        // Left: P=1, R=2/3, F1=0.8
        let left = report.per_class[0];
        assert_eq!(left.support, 3);
        assert!((left.precision - 1.0).abs() < 1e-9);
        assert!((left.f1 - 0.8).abs() < 1e-9);
        // Neutral: P=0.5, R=1, F1=2/3
        assert!((report.per_class[1].f1 - 2.0 / 3.0).abs() < 1e-9);
        // Right: P=0.5, R=0.5, F1=0.5
        assert!((report.per_class[2].f1 - 0.5).abs() < 1e-9);

        let macro_f1 = (0.8 + 2.0 / 3.0 + 0.5) / 3.0;
        assert!((report.macro_f1 - macro_f1).abs() < 1e-9);
        let weighted_f1 = (0.8 * 3.0 + 2.0 / 3.0 + 0.5 * 2.0) / 6.0;
        assert!((report.weighted_f1 - weighted_f1).abs() < 1e-9);
    }

    #[test]
    fn empty_calculator_reports_zeroes() {
        let report = MetricsCalculator::new().finalize();
        assert_eq!(report.total, 0);
        assert!(report.accuracy.abs() < f64::EPSILON);
        assert!(report.weighted_f1.abs() < f64::EPSILON);
        assert_eq!(report.per_class.len(), 3);
    }
}
