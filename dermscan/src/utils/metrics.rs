//! Evaluation metrics
//!
//! Loss is tracked by the training loop itself; this module covers the
//! label side: confusion matrix, per-class precision/recall/F1, and the
//! macro-averaged scores reported after every epoch. Macro F1 is the
//! headline number because the lesion classes are imbalanced.

use serde::{Deserialize, Serialize};

/// Confusion matrix over class indices.
///
/// Stored row-major as `matrix[actual * num_classes + predicted]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub num_classes: usize,
    pub matrix: Vec<usize>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            matrix: vec![0; num_classes * num_classes],
        }
    }

    /// Count every (actual, predicted) pair into a fresh matrix
    pub fn from_predictions(predictions: &[usize], labels: &[usize], num_classes: usize) -> Self {
        let mut cm = Self::new(num_classes);
        for (&predicted, &actual) in predictions.iter().zip(labels) {
            cm.add(actual, predicted);
        }
        cm
    }

    fn index(&self, actual: usize, predicted: usize) -> Option<usize> {
        (actual < self.num_classes && predicted < self.num_classes)
            .then_some(actual * self.num_classes + predicted)
    }

    /// Record one prediction. Out-of-range indices are ignored.
    pub fn add(&mut self, actual: usize, predicted: usize) {
        if let Some(i) = self.index(actual, predicted) {
            self.matrix[i] += 1;
        }
    }

    /// Count at (actual, predicted), zero when out of range
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        self.index(actual, predicted).map_or(0, |i| self.matrix[i])
    }

    /// Sum of one row: how many samples actually belong to `actual`
    pub fn row_sum(&self, actual: usize) -> usize {
        (0..self.num_classes).map(|p| self.get(actual, p)).sum()
    }

    /// Sum of one column: how many samples were predicted as `predicted`
    pub fn col_sum(&self, predicted: usize) -> usize {
        (0..self.num_classes).map(|a| self.get(a, predicted)).sum()
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().sum()
    }

    /// Diagonal sum
    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|i| self.get(i, i)).sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Render the matrix as a table, optionally labeling rows and columns
    pub fn display(&self, class_names: Option<&[&str]>) -> String {
        use std::fmt::Write as _;

        let label = |idx: usize| -> String {
            match class_names.and_then(|names| names.get(idx)) {
                Some(name) => name[..name.len().min(9)].to_string(),
                None => idx.to_string(),
            }
        };

        let mut out = String::from("\nConfusion matrix (rows actual, columns predicted):\n\n");

        out.push_str("            ");
        for col in 0..self.num_classes {
            let _ = write!(out, "{:>10}", label(col));
        }
        out.push('\n');

        for row in 0..self.num_classes {
            let _ = write!(out, "{:>10}  ", label(row));
            for col in 0..self.num_classes {
                match (row == col, self.get(row, col)) {
                    (true, n) => {
                        let _ = write!(out, "  [{:>5}] ", n);
                    }
                    (false, 0) => out.push_str("       .  "),
                    (false, n) => {
                        let _ = write!(out, "   {:>5}  ", n);
                    }
                }
            }
            out.push('\n');
        }

        let _ = write!(out, "\nOverall accuracy: {:.2}%\n", self.accuracy() * 100.0);
        out
    }
}

impl std::fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display(None))
    }
}

/// Precision, recall, and F1 for one class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class_idx: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of samples whose true label is this class
    pub support: usize,
}

impl ClassMetrics {
    /// Derive the per-class scores from a confusion matrix.
    ///
    /// The column sum counts everything predicted as this class, the
    /// row sum everything that actually is this class.
    pub fn from_confusion_matrix(cm: &ConfusionMatrix, class_idx: usize) -> Self {
        let true_positives = cm.get(class_idx, class_idx);
        let support = cm.row_sum(class_idx);
        let predicted_total = cm.col_sum(class_idx);

        let precision = ratio(true_positives, predicted_total);
        let recall = ratio(true_positives, support);

        Self {
            class_idx,
            true_positives,
            false_positives: predicted_total - true_positives,
            false_negatives: support - true_positives,
            precision,
            recall,
            f1: harmonic_mean(precision, recall),
            support,
        }
    }
}

/// Everything computed from one evaluation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub total_samples: usize,
    pub correct_predictions: usize,
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    /// Unweighted mean of per-class F1, the per-epoch headline score
    pub macro_f1: f64,
    pub per_class: Vec<ClassMetrics>,
    pub confusion_matrix: ConfusionMatrix,
}

impl Metrics {
    /// Compute metrics from predicted and true labels.
    ///
    /// Macro averages run over classes that actually appear in the
    /// labels, so absent classes do not dilute the scores.
    pub fn from_predictions(predictions: &[usize], labels: &[usize], num_classes: usize) -> Self {
        assert_eq!(
            predictions.len(),
            labels.len(),
            "predictions and labels must align"
        );

        if predictions.is_empty() {
            return Self::default();
        }

        let confusion_matrix = ConfusionMatrix::from_predictions(predictions, labels, num_classes);
        let per_class: Vec<ClassMetrics> = (0..num_classes)
            .map(|idx| ClassMetrics::from_confusion_matrix(&confusion_matrix, idx))
            .collect();

        let mut macro_precision = 0.0;
        let mut macro_recall = 0.0;
        let mut macro_f1 = 0.0;
        let mut represented = 0usize;
        for class in per_class.iter().filter(|c| c.support > 0) {
            macro_precision += class.precision;
            macro_recall += class.recall;
            macro_f1 += class.f1;
            represented += 1;
        }
        if represented > 0 {
            macro_precision /= represented as f64;
            macro_recall /= represented as f64;
            macro_f1 /= represented as f64;
        }

        let total_samples = predictions.len();
        let correct_predictions = confusion_matrix.correct();

        Self {
            total_samples,
            correct_predictions,
            accuracy: ratio(correct_predictions, total_samples),
            macro_precision,
            macro_recall,
            macro_f1,
            per_class,
            confusion_matrix,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Harmonic mean of precision and recall, zero when both are zero
fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        (2.0 * precision * recall) / (precision + recall)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix_counts() {
        let labels = vec![0, 0, 0, 0, 1, 1, 1, 2, 2, 2, 2, 2];
        let predictions = vec![0, 0, 1, 0, 1, 1, 0, 2, 2, 1, 2, 0];

        let cm = ConfusionMatrix::from_predictions(&predictions, &labels, 3);

        assert_eq!(cm.get(0, 0), 3);
        assert_eq!(cm.get(1, 1), 2);
        assert_eq!(cm.get(2, 2), 3);
        assert_eq!(cm.get(2, 0), 1);
        assert_eq!(cm.get(0, 2), 0);

        assert_eq!(cm.total(), 12);
        assert_eq!(cm.correct(), 8);
        assert!((cm.accuracy() - 8.0 / 12.0).abs() < 1e-9);

        // Rows follow the true labels, columns the predictions.
        assert_eq!(cm.row_sum(0), 4);
        assert_eq!(cm.row_sum(2), 5);
        assert_eq!(cm.col_sum(0), 5);
        assert_eq!(cm.col_sum(2), 3);
    }

    #[test]
    fn test_out_of_range_labels_are_dropped() {
        let mut cm = ConfusionMatrix::new(2);
        cm.add(0, 0);
        cm.add(5, 1);
        cm.add(1, 7);

        assert_eq!(cm.total(), 1);
        assert_eq!(cm.get(5, 1), 0);
    }

    #[test]
    fn test_per_class_scores() {
        let predictions = vec![1, 0, 1, 1, 0, 0];
        let labels = vec![1, 0, 0, 1, 0, 1];

        let cm = ConfusionMatrix::from_predictions(&predictions, &labels, 2);
        let class1 = ClassMetrics::from_confusion_matrix(&cm, 1);

        assert_eq!(class1.true_positives, 2);
        assert_eq!(class1.false_positives, 1);
        assert_eq!(class1.false_negatives, 1);
        assert_eq!(class1.support, 3);
        assert!((class1.precision - 2.0 / 3.0).abs() < 1e-9);
        assert!((class1.recall - 2.0 / 3.0).abs() < 1e-9);
        assert!((class1.f1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_macro_f1() {
        // class 0: precision 1.0, recall 2/3 -> F1 0.8
        // class 1: precision 0.5, recall 1.0 -> F1 2/3
        let predictions = vec![0, 1, 1, 0];
        let labels = vec![0, 1, 0, 0];

        let metrics = Metrics::from_predictions(&predictions, &labels, 2);

        assert_eq!(metrics.total_samples, 4);
        assert_eq!(metrics.correct_predictions, 3);
        assert!((metrics.accuracy - 0.75).abs() < 1e-9);
        assert!((metrics.per_class[0].f1 - 0.8).abs() < 1e-9);
        assert!((metrics.per_class[1].f1 - 2.0 / 3.0).abs() < 1e-9);
        assert!((metrics.macro_f1 - (0.8 + 2.0 / 3.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_macro_f1_skips_absent_classes() {
        // Only classes 0 and 1 appear in the labels; classes 2..5 must
        // not drag the macro average down.
        let predictions = vec![0, 1, 0, 1];
        let labels = vec![0, 1, 1, 0];

        let metrics = Metrics::from_predictions(&predictions, &labels, 5);

        assert_eq!(metrics.per_class.len(), 5);
        assert!((metrics.macro_f1 - 0.5).abs() < 1e-9);
        assert_eq!(metrics.per_class[3].support, 0);
    }

    #[test]
    fn test_empty_predictions() {
        let metrics = Metrics::from_predictions(&[], &[], 5);
        assert_eq!(metrics.total_samples, 0);
        assert_eq!(metrics.macro_f1, 0.0);
    }

    #[test]
    fn test_confusion_matrix_display() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1], &[0, 1], 2);
        let shown = cm.display(Some(&["Eczema", "Acne"]));
        assert!(shown.contains("Eczema"));
        assert!(shown.contains("Overall accuracy: 100.00%"));
    }
}
