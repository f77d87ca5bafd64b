use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Row-wise softmax of `scores`.
///
/// Each row is shifted by its maximum before exponentiating, so large scores do not overflow.
///
/// # Arguments
/// * `scores` - A `N x K` matrix of unnormalized class scores.
///
/// # Returns
/// A `N x K` matrix whose rows are probability distributions.
pub fn softmax(scores: ArrayView2<f32>) -> Array2<f32> {
    let mut probs = scores.to_owned();

    for mut row in probs.rows_mut() {
        let max = row_max(row.view());
        row.mapv_inplace(|z| (z - max).exp());
        let sum = row.sum();
        row /= sum;
    }

    probs
}

/// Row-wise logarithm of the softmax of `scores`, computed as `z - logsumexp(z)`.
///
/// Unlike `softmax(scores).ln()`, this never evaluates `ln(0)` when a probability underflows.
pub fn log_softmax(scores: ArrayView2<f32>) -> Array2<f32> {
    let mut log_probs = scores.to_owned();

    for mut row in log_probs.rows_mut() {
        let max = row_max(row.view());
        let log_sum = row.iter().map(|&z| (z - max).exp()).sum::<f32>().ln() + max;
        row.mapv_inplace(|z| z - log_sum);
    }

    log_probs
}

/// Index of the maximum of each row, ties resolved to the lowest index.
pub fn argmax_rows(m: ArrayView2<f32>) -> Array1<usize> {
    m.rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            for (j, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = j;
                }
            }
            best
        })
        .collect()
}

fn row_max(row: ArrayView1<f32>) -> f32 {
    row.fold(f32::NEG_INFINITY, |acc, &z| acc.max(z))
}
