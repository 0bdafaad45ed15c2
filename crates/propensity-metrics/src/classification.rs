use propensity_core::{PipelineError, Result};
use std::fmt;

/// Fraction of correct predictions.
pub fn accuracy(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(&t, &p)| (t - p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Binary confusion counts with the derived rates the evaluation prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryConfusion {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl BinaryConfusion {
    pub fn from_predictions(y_true: &[f64], y_pred: &[f64]) -> Self {
        let mut c = BinaryConfusion {
            tp: 0,
            tn: 0,
            fp: 0,
            fn_: 0,
        };
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (p >= 0.5, t >= 0.5) {
                (true, true) => c.tp += 1,
                (true, false) => c.fp += 1,
                (false, true) => c.fn_ += 1,
                (false, false) => c.tn += 1,
            }
        }
        c
    }

    /// True positive rate, TP / (TP + FN).
    pub fn sensitivity(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// True negative rate, TN / (TN + FP).
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        self.sensitivity()
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Per-class precision/recall/F1/support summary.
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Text-renderable classification report over 0/1 labels.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub total: usize,
}

pub fn classification_report(y_true: &[f64], y_pred: &[f64]) -> ClassificationReport {
    let classes = [0.0, 1.0]
        .iter()
        .map(|&class| {
            let tp = count(y_true, y_pred, |t, p| t == class && p == class);
            let fp = count(y_true, y_pred, |t, p| t != class && p == class);
            let fn_ = count(y_true, y_pred, |t, p| t == class && p != class);
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassMetrics {
                label: format!("{}", class as usize),
                precision,
                recall,
                f1,
                support: tp + fn_,
            }
        })
        .collect();

    ClassificationReport {
        classes,
        accuracy: accuracy(y_true, y_pred),
        total: y_true.len(),
    }
}

fn count<F: Fn(f64, f64) -> bool>(y_true: &[f64], y_pred: &[f64], f: F) -> usize {
    y_true
        .iter()
        .zip(y_pred)
        .filter(|(&t, &p)| f(t.round(), p.round()))
        .count()
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>12} {:>29.2} {:>9}", "accuracy", self.accuracy, self.total)
    }
}

/// ROC curve over descending score thresholds.
///
/// Returns `(fpr, tpr, thresholds)`; the curve starts at (0, 0) with an
/// infinite threshold, one point per distinct score after that.
pub fn roc_curve(y_true: &[f64], y_score: &[f64]) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    if y_true.len() != y_score.len() {
        return Err(PipelineError::DimensionMismatch(format!(
            "labels ({}) and scores ({}) differ in length",
            y_true.len(),
            y_score.len()
        )));
    }
    let total_pos = y_true.iter().filter(|&&t| t > 0.5).count() as f64;
    let total_neg = y_true.len() as f64 - total_pos;
    if total_pos == 0.0 || total_neg == 0.0 {
        return Err(PipelineError::InvalidParameter(
            "roc_curve needs both classes present".to_string(),
        ));
    }

    let mut pairs: Vec<(f64, f64)> = y_score
        .iter()
        .zip(y_true)
        .map(|(&s, &t)| (s, t.round()))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];

    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut i = 0;
    while i < pairs.len() {
        let threshold = pairs[i].0;
        // Consume every pair tied at this score before emitting a point.
        loop {
            if pairs[i].1 > 0.5 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
            if i >= pairs.len() || pairs[i].0 != threshold {
                break;
            }
        }
        fpr.push(fp / total_neg);
        tpr.push(tp / total_pos);
        thresholds.push(threshold);
    }

    Ok((fpr, tpr, thresholds))
}

/// Trapezoidal area under a curve given by `x` (ascending) and `y`.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    let mut area = 0.0;
    for i in 1..x.len().min(y.len()) {
        area += (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.0;
    }
    area
}

/// Area under the ROC curve of `y_score` against binary `y_true`.
pub fn roc_auc_score(y_true: &[f64], y_score: &[f64]) -> Result<f64> {
    let (fpr, tpr, _) = roc_curve(y_true, y_score)?;
    Ok(auc(&fpr, &tpr))
}

/// Binary cross-entropy of probabilistic predictions.
pub fn log_loss(y_true: &[f64], y_proba: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let eps = 1e-15;
    let total: f64 = y_true
        .iter()
        .zip(y_proba)
        .map(|(&y, &p)| {
            let p = p.clamp(eps, 1.0 - eps);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / y_true.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_accuracy() {
        let y_true = [0.0, 1.0, 1.0, 0.0, 1.0];
        let y_pred = [0.0, 1.0, 0.0, 0.0, 1.0];
        assert_relative_eq!(accuracy(&y_true, &y_pred), 0.8);
    }

    #[test]
    fn test_confusion_counts() {
        let y_true = [1.0, 1.0, 0.0, 0.0, 1.0];
        let y_pred = [1.0, 0.0, 0.0, 1.0, 1.0];
        let c = BinaryConfusion::from_predictions(&y_true, &y_pred);
        assert_eq!((c.tp, c.tn, c.fp, c.fn_), (2, 1, 1, 1));
        assert_relative_eq!(c.sensitivity(), 2.0 / 3.0);
        assert_relative_eq!(c.specificity(), 0.5);
        assert_relative_eq!(c.precision(), 2.0 / 3.0);
    }

    #[test]
    fn test_perfect_and_reversed_auc() {
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let ascending = [0.1, 0.2, 0.8, 0.9];
        let descending = [0.9, 0.8, 0.2, 0.1];
        assert_relative_eq!(roc_auc_score(&y_true, &ascending).unwrap(), 1.0);
        assert_relative_eq!(roc_auc_score(&y_true, &descending).unwrap(), 0.0);
    }

    #[test]
    fn test_constant_scores_are_chance() {
        let y_true = [0.0, 1.0, 0.0, 1.0];
        let scores = [0.5, 0.5, 0.5, 0.5];
        assert_relative_eq!(roc_auc_score(&y_true, &scores).unwrap(), 0.5);
    }

    #[test]
    fn test_single_class_is_rejected() {
        assert!(roc_auc_score(&[1.0, 1.0], &[0.1, 0.9]).is_err());
    }

    #[test]
    fn test_roc_curve_endpoints() {
        let y_true = [0.0, 1.0, 0.0, 1.0];
        let scores = [0.2, 0.9, 0.4, 0.6];
        let (fpr, tpr, thresholds) = roc_curve(&y_true, &scores).unwrap();

        assert_eq!(fpr[0], 0.0);
        assert_eq!(tpr[0], 0.0);
        assert!(thresholds[0].is_infinite());
        assert_relative_eq!(*fpr.last().unwrap(), 1.0);
        assert_relative_eq!(*tpr.last().unwrap(), 1.0);
    }

    #[test]
    fn test_log_proba_scores_keep_auc() {
        // AUC is rank-based: a monotone transform of the scores leaves it
        // untouched, so log-probabilities score like probabilities.
        let y_true = [0.0, 1.0, 0.0, 1.0, 1.0];
        let proba: [f64; 5] = [0.2, 0.7, 0.4, 0.9, 0.6];
        let log_proba: Vec<f64> = proba.iter().map(|p| p.ln()).collect();
        assert_relative_eq!(
            roc_auc_score(&y_true, &proba).unwrap(),
            roc_auc_score(&y_true, &log_proba).unwrap()
        );
    }

    #[test]
    fn test_classification_report() {
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let y_pred = [0.0, 1.0, 1.0, 1.0];
        let report = classification_report(&y_true, &y_pred);

        assert_eq!(report.classes[0].support, 2);
        assert_relative_eq!(report.classes[1].precision, 2.0 / 3.0);
        assert_relative_eq!(report.classes[1].recall, 1.0);
        assert_relative_eq!(report.accuracy, 0.75);

        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("accuracy"));
    }

    #[test]
    fn test_log_loss() {
        let y_true = [1.0, 0.0];
        let perfect = [1.0, 0.0];
        let poor = [0.5, 0.5];
        assert!(log_loss(&y_true, &perfect) < 1e-10);
        assert_relative_eq!(log_loss(&y_true, &poor), 2.0f64.ln(), epsilon = 1e-12);
    }
}
