use ndarray::{Array2, ArrayView1, ArrayView2};

use super::LossFn;
use crate::arch::activations::{log_softmax, softmax};

/// Negative log-likelihood of the true labels under the softmax of the scores, averaged over
/// the batch (a.k.a. softmax cross-entropy).
///
/// # Panics
/// If a label is not a valid column of `scores`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NegativeLogLikelihood;

impl NegativeLogLikelihood {
    /// Returns a new `NegativeLogLikelihood`.
    pub fn new() -> Self {
        Self
    }

    /// Computes `-mean(log(p[i, y_i]))` straight from a matrix of probabilities.
    ///
    /// A zero probability for a true class gives `+inf`; prefer `loss` on the scores.
    pub fn of_probabilities(&self, probs: ArrayView2<f32>, labels: ArrayView1<usize>) -> f32 {
        if labels.is_empty() {
            return 0.0;
        }

        let log_likelihood: f32 = labels
            .iter()
            .enumerate()
            .map(|(i, &y)| probs[[i, y]].ln())
            .sum();

        -log_likelihood / labels.len() as f32
    }
}

impl LossFn for NegativeLogLikelihood {
    fn loss(&self, scores: ArrayView2<f32>, labels: ArrayView1<usize>) -> f32 {
        if labels.is_empty() {
            return 0.0;
        }

        let log_probs = log_softmax(scores);
        let log_likelihood: f32 = labels
            .iter()
            .enumerate()
            .map(|(i, &y)| log_probs[[i, y]])
            .sum();

        -log_likelihood / labels.len() as f32
    }

    // (softmax(z) - onehot(y)) / N
    fn loss_prime(&self, scores: ArrayView2<f32>, labels: ArrayView1<usize>) -> Array2<f32> {
        let mut d = softmax(scores);

        for (i, &y) in labels.iter().enumerate() {
            d[[i, y]] -= 1.0;
        }

        d /= labels.len().max(1) as f32;
        d
    }
}
