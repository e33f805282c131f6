//! Evaluation metrics for multi-class predictions

use ndarray::{Array1, Array2};
use selvagis_core::{Error, Result};
use std::fmt;

/// Fraction of predictions equal to the truth
pub fn accuracy(truth: &Array1<i32>, predicted: &Array1<i32>) -> Result<f64> {
    check_lengths(truth, predicted)?;
    if truth.is_empty() {
        return Err(Error::Pipeline("accuracy of zero samples".to_string()));
    }

    let hits = truth
        .iter()
        .zip(predicted.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(hits as f64 / truth.len() as f64)
}

/// Confusion matrix over a fixed ordered list of class codes.
///
/// `matrix[(i, j)]` counts samples of true class `codes[i]` predicted as
/// `codes[j]`. Pairs whose true or predicted code is not in `codes` are
/// ignored.
pub fn confusion_matrix(
    truth: &Array1<i32>,
    predicted: &Array1<i32>,
    codes: &[i32],
) -> Result<Array2<usize>> {
    check_lengths(truth, predicted)?;

    let index_of = |code: i32| codes.iter().position(|&c| c == code);
    let mut matrix = Array2::zeros((codes.len(), codes.len()));

    for (&t, &p) in truth.iter().zip(predicted.iter()) {
        if let (Some(i), Some(j)) = (index_of(t), index_of(p)) {
            matrix[(i, j)] += 1;
        }
    }

    Ok(matrix)
}

/// Per-class precision/recall/F1 for one class code
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    pub code: i32,
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true samples of this class
    pub support: usize,
}

/// Full classification report: per-class metrics plus overall summaries
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_f1: f64,
}

impl ClassificationReport {
    /// Compute the report against a fixed ordered `(code, name)` legend
    pub fn compute(
        truth: &Array1<i32>,
        predicted: &Array1<i32>,
        classes: &[(i32, String)],
    ) -> Result<Self> {
        let codes: Vec<i32> = classes.iter().map(|(c, _)| *c).collect();
        let matrix = confusion_matrix(truth, predicted, &codes)?;
        let overall = accuracy(truth, predicted)?;

        let mut rows = Vec::with_capacity(classes.len());
        for (i, (code, name)) in classes.iter().enumerate() {
            let true_positive = matrix[(i, i)] as f64;
            let predicted_count: usize = (0..codes.len()).map(|r| matrix[(r, i)]).sum();
            let support: usize = (0..codes.len()).map(|c| matrix[(i, c)]).sum();

            let precision = safe_div(true_positive, predicted_count as f64);
            let recall = safe_div(true_positive, support as f64);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            rows.push(ClassMetrics {
                code: *code,
                name: name.clone(),
                precision,
                recall,
                f1,
                support,
            });
        }

        let macro_f1 = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|r| r.f1).sum::<f64>() / rows.len() as f64
        };

        Ok(Self {
            classes: rows,
            accuracy: overall,
            macro_f1,
        })
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<26} {:>9} {:>9} {:>9} {:>9}",
            "class", "precision", "recall", "f1", "support"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:<26} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                c.name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "accuracy: {:.4}", self.accuracy)?;
        write!(f, "macro F1: {:.4}", self.macro_f1)
    }
}

fn safe_div(a: f64, b: f64) -> f64 {
    if b > 0.0 {
        a / b
    } else {
        0.0
    }
}

fn check_lengths(truth: &Array1<i32>, predicted: &Array1<i32>) -> Result<()> {
    if truth.len() != predicted.len() {
        return Err(Error::Pipeline(format!(
            "truth has {} samples, predictions {}",
            truth.len(),
            predicted.len()
        )));
    }
    Ok(())
}
