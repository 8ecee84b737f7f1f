//! Classification Report

use crate::ScorerError;
use serde::Serialize;
use std::fmt;

/// Confusion counts for the delayed (positive) class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl EvaluationReport {
    /// Compare predictions against true labels, row by row
    pub fn from_predictions(labels: &[u8], predictions: &[u8]) -> Result<Self, ScorerError> {
        if labels.len() != predictions.len() {
            return Err(ScorerError::ShapeMismatch {
                features: predictions.len(),
                labels: labels.len(),
            });
        }
        let mut report = Self::default();
        for (&y, &p) in labels.iter().zip(predictions) {
            match (y == 1, p == 1) {
                (true, true) => report.true_positives += 1,
                (false, true) => report.false_positives += 1,
                (false, false) => report.true_negatives += 1,
                (true, false) => report.false_negatives += 1,
            }
        }
        Ok(report)
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} tp={} fp={} tn={} fn={} precision={:.3} recall={:.3} f1={:.3} accuracy={:.3}",
            self.total(),
            self.true_positives,
            self.false_positives,
            self.true_negatives,
            self.false_negatives,
            self.precision(),
            self.recall(),
            self.f1(),
            self.accuracy()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_counts() {
        let report =
            EvaluationReport::from_predictions(&[1, 1, 0, 0, 1], &[1, 0, 1, 0, 1]).unwrap();
        assert_eq!(report.true_positives, 2);
        assert_eq!(report.false_negatives, 1);
        assert_eq!(report.false_positives, 1);
        assert_eq!(report.true_negatives, 1);
        assert!((report.precision() - 2.0 / 3.0).abs() < 1e-9);
        assert!((report.recall() - 2.0 / 3.0).abs() < 1e-9);
        assert!((report.accuracy() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_no_positive_predictions() {
        let report = EvaluationReport::from_predictions(&[1, 0], &[0, 0]).unwrap();
        assert_eq!(report.precision(), 0.0);
        assert_eq!(report.f1(), 0.0);
        assert!(report.to_string().contains("n=2"));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(EvaluationReport::from_predictions(&[1], &[]).is_err());
    }
}
