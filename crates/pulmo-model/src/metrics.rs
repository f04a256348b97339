//! Hand-computed evaluation metrics: accuracy plus a per-class report
//! (precision / recall / F1 / support).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-class slice of the evaluation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true instances of this class in the evaluation split.
    pub support: usize,
}

/// Result of one evaluation pass. Not persisted here; the registry publisher
/// records it alongside the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Fraction of correct predictions, in [0, 1].
    pub accuracy: f64,
    /// Class name -> metrics, keyed by the artifact's label names.
    pub report: BTreeMap<String, ClassMetrics>,
}

/// Compute accuracy and the per-class report from parallel truth/prediction
/// slices. `labels[i]` names class code `i`; codes outside the label range
/// still count toward accuracy but get no report row.
pub fn evaluate_predictions(
    labels: &[String],
    y_true: &[u32],
    y_pred: &[u32],
) -> EvaluationResult {
    assert_eq!(y_true.len(), y_pred.len(), "truth/prediction length mismatch");

    let total = y_true.len();
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(t, p)| t == p)
        .count();
    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    };

    let mut report = BTreeMap::new();
    for (code, name) in labels.iter().enumerate() {
        let code = code as u32;
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fneg = 0usize;
        let mut support = 0usize;
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t == code {
                support += 1;
                if p == code {
                    tp += 1;
                } else {
                    fneg += 1;
                }
            } else if p == code {
                fp += 1;
            }
        }
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fneg);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        report.insert(
            name.clone(),
            ClassMetrics {
                precision,
                recall,
                f1,
                support,
            },
        );
    }

    EvaluationResult { accuracy, report }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
