//! Evaluation metrics for the digit classifier: accuracy, per-class
//! precision/recall/F1, and the confusion matrix persisted after training.

use serde::{Deserialize, Serialize};

/// Summary metrics over an evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    /// Total number of samples evaluated
    pub total_samples: usize,

    /// Number of correct predictions
    pub correct_predictions: usize,

    /// Overall accuracy (correct / total)
    pub accuracy: f64,

    /// Average loss, when the caller computed one
    pub loss: Option<f64>,

    /// Per-class metrics, indexed by digit
    pub per_class: Vec<ClassMetrics>,

    /// Confusion matrix (rows = actual, columns = predicted)
    pub confusion_matrix: ConfusionMatrix,
}

impl Metrics {
    /// Build metrics from parallel prediction and ground-truth slices
    pub fn from_predictions(
        predictions: &[usize],
        ground_truth: &[usize],
        num_classes: usize,
    ) -> Self {
        assert_eq!(
            predictions.len(),
            ground_truth.len(),
            "predictions and ground truth must have same length"
        );

        let total_samples = predictions.len();
        let confusion_matrix =
            ConfusionMatrix::from_predictions(predictions, ground_truth, num_classes);

        let correct_predictions = confusion_matrix.correct();
        let accuracy = if total_samples > 0 {
            correct_predictions as f64 / total_samples as f64
        } else {
            0.0
        };

        let per_class = (0..num_classes)
            .map(|class| ClassMetrics::from_confusion_matrix(&confusion_matrix, class))
            .collect();

        Self {
            total_samples,
            correct_predictions,
            accuracy,
            loss: None,
            per_class,
            confusion_matrix,
        }
    }

    /// Render a compact per-class table for the terminal
    pub fn display(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Accuracy: {:.2}% ({}/{})\n",
            self.accuracy * 100.0,
            self.correct_predictions,
            self.total_samples
        ));
        if let Some(loss) = self.loss {
            out.push_str(&format!("Loss:     {:.4}\n", loss));
        }
        out.push_str("\ndigit  precision  recall     f1  support\n");
        for m in &self.per_class {
            out.push_str(&format!(
                "{:>5}     {:>6.2}%  {:>5.2}%  {:>5.3}  {:>7}\n",
                m.class,
                m.precision * 100.0,
                m.recall * 100.0,
                m.f1,
                m.support
            ));
        }
        out
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Precision/recall/F1 for a single class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Class index (the digit)
    pub class: usize,

    /// Precision = TP / (TP + FP)
    pub precision: f64,

    /// Recall = TP / (TP + FN)
    pub recall: f64,

    /// F1 = harmonic mean of precision and recall
    pub f1: f64,

    /// Number of actual samples of this class
    pub support: usize,
}

impl ClassMetrics {
    /// Derive a class's metrics from a confusion matrix
    pub fn from_confusion_matrix(cm: &ConfusionMatrix, class: usize) -> Self {
        let true_positives = cm.get(class, class);

        let false_positives: usize = (0..cm.num_classes)
            .filter(|&actual| actual != class)
            .map(|actual| cm.get(actual, class))
            .sum();

        let false_negatives: usize = (0..cm.num_classes)
            .filter(|&predicted| predicted != class)
            .map(|predicted| cm.get(class, predicted))
            .sum();

        let support = true_positives + false_negatives;

        let precision = if true_positives + false_positives > 0 {
            true_positives as f64 / (true_positives + false_positives) as f64
        } else {
            0.0
        };

        let recall = if support > 0 {
            true_positives as f64 / support as f64
        } else {
            0.0
        };

        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            class,
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Confusion matrix for multi-class classification
///
/// Stored as a flat row-major vector; row = actual class, column =
/// predicted class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Number of classes
    pub num_classes: usize,

    /// Flat counts, row-major
    pub matrix: Vec<usize>,
}

impl ConfusionMatrix {
    /// Create an empty confusion matrix
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            matrix: vec![0; num_classes * num_classes],
        }
    }

    /// Build a matrix from parallel prediction and ground-truth slices
    pub fn from_predictions(
        predictions: &[usize],
        ground_truth: &[usize],
        num_classes: usize,
    ) -> Self {
        let mut cm = Self::new(num_classes);
        for (&pred, &actual) in predictions.iter().zip(ground_truth.iter()) {
            cm.add(actual, pred);
        }
        cm
    }

    /// Record a single prediction
    pub fn add(&mut self, actual: usize, predicted: usize) {
        if actual < self.num_classes && predicted < self.num_classes {
            self.matrix[actual * self.num_classes + predicted] += 1;
        }
    }

    /// Count at (actual, predicted)
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        if actual < self.num_classes && predicted < self.num_classes {
            self.matrix[actual * self.num_classes + predicted]
        } else {
            0
        }
    }

    /// Total number of recorded samples
    pub fn total(&self) -> usize {
        self.matrix.iter().sum()
    }

    /// Number of correct predictions (diagonal sum)
    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|i| self.get(i, i)).sum()
    }

    /// Overall accuracy
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total > 0 {
            self.correct() as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Per-row totals (actual class counts)
    pub fn row_sums(&self) -> Vec<usize> {
        (0..self.num_classes)
            .map(|row| (0..self.num_classes).map(|col| self.get(row, col)).sum())
            .collect()
    }

    /// Row-normalized matrix (each row sums to 1, empty rows stay 0)
    pub fn normalize_rows(&self) -> Vec<Vec<f64>> {
        let row_sums = self.row_sums();
        (0..self.num_classes)
            .map(|row| {
                let sum = row_sums[row] as f64;
                (0..self.num_classes)
                    .map(|col| {
                        if sum > 0.0 {
                            self.get(row, col) as f64 / sum
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Render the matrix for the terminal
    pub fn display(&self) -> String {
        let mut out = String::new();
        out.push_str("\nConfusion matrix (rows = actual, cols = predicted):\n\n      ");
        for col in 0..self.num_classes {
            out.push_str(&format!("{:>6}", col));
        }
        out.push('\n');

        for row in 0..self.num_classes {
            out.push_str(&format!("{:>5} ", row));
            for col in 0..self.num_classes {
                let count = self.get(row, col);
                if row == col {
                    out.push_str(&format!("[{:>4}]", count));
                } else if count > 0 {
                    out.push_str(&format!(" {:>4} ", count));
                } else {
                    out.push_str("    . ");
                }
            }
            out.push('\n');
        }

        out.push_str(&format!("\nAccuracy: {:.2}%\n", self.accuracy() * 100.0));
        out
    }

    /// Save the raw counts as CSV
    pub fn save_csv(&self, path: &std::path::Path) -> std::io::Result<()> {
        let mut content = String::new();

        content.push_str("actual\\predicted");
        for col in 0..self.num_classes {
            content.push_str(&format!(",{}", col));
        }
        content.push('\n');

        for row in 0..self.num_classes {
            content.push_str(&format!("{}", row));
            for col in 0..self.num_classes {
                content.push_str(&format!(",{}", self.get(row, col)));
            }
            content.push('\n');
        }

        std::fs::write(path, content)
    }
}

impl std::fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix_counts() {
        let predictions = vec![0, 1, 2, 0, 1, 2, 0, 0, 2, 2];
        let ground_truth = vec![0, 1, 2, 0, 2, 2, 1, 0, 1, 2];

        let cm = ConfusionMatrix::from_predictions(&predictions, &ground_truth, 3);

        assert_eq!(cm.get(0, 0), 3);
        assert_eq!(cm.get(1, 1), 1);
        assert_eq!(cm.get(2, 2), 3);
        assert_eq!(cm.total(), 10);
        assert_eq!(cm.correct(), 7);
        assert!((cm.accuracy() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_row_normalization() {
        let mut cm = ConfusionMatrix::new(2);
        cm.add(0, 0);
        cm.add(0, 0);
        cm.add(0, 1);
        cm.add(1, 1);

        let rows = cm.normalize_rows();
        assert!((rows[0][0] - 2.0 / 3.0).abs() < 1e-9);
        assert!((rows[0][1] - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(rows[1][1], 1.0);
    }

    #[test]
    fn test_class_metrics() {
        let predictions = vec![0, 0, 0, 1, 1];
        let ground_truth = vec![0, 0, 1, 1, 0];

        let cm = ConfusionMatrix::from_predictions(&predictions, &ground_truth, 2);
        let class0 = ClassMetrics::from_confusion_matrix(&cm, 0);

        // class 0: TP = 2, FP = 1, FN = 1
        assert!((class0.precision - 2.0 / 3.0).abs() < 1e-9);
        assert!((class0.recall - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(class0.support, 3);
    }

    #[test]
    fn test_metrics_from_predictions() {
        let predictions = vec![3, 3, 7];
        let ground_truth = vec![3, 7, 7];

        let metrics = Metrics::from_predictions(&predictions, &ground_truth, 10);

        assert_eq!(metrics.total_samples, 3);
        assert_eq!(metrics.correct_predictions, 2);
        assert_eq!(metrics.per_class.len(), 10);
        assert_eq!(metrics.per_class[7].support, 2);
    }

    #[test]
    fn test_csv_export() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1], &[0, 0], 2);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cm.csv");
        cm.save_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("actual\\predicted,0,1"));
        assert!(content.contains("0,1,1"));
    }
}
