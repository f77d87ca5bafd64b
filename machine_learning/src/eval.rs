use std::num::NonZeroUsize;

use ndarray::ArrayView1;

use crate::{MlErr, Result, arch::Model, data::Dataset};

/// Fraction of positions where `predicted` disagrees with `labels`.
///
/// # Errors
/// If the two have different lengths or are empty.
pub fn misclassification_rate(
    predicted: ArrayView1<usize>,
    labels: ArrayView1<usize>,
) -> Result<f32> {
    if predicted.len() != labels.len() {
        return Err(MlErr::SizeMismatch {
            what: "predictions",
            got: predicted.len(),
            expected: labels.len(),
        });
    }

    if labels.is_empty() {
        return Err(MlErr::EmptyDataset("batch"));
    }

    let wrong = predicted
        .iter()
        .zip(labels.iter())
        .filter(|(p, y)| p != y)
        .count();

    Ok(wrong as f32 / labels.len() as f32)
}

/// Traverses `dataset` in order and returns the mean of the per-minibatch misclassification
/// rates.
///
/// A trailing partial batch weighs as much as a full one.
pub fn mean_error<M: Model>(
    model: &M,
    params: &[f32],
    dataset: &Dataset,
    batch_size: NonZeroUsize,
) -> Result<f32> {
    let mut total = 0.0;
    let mut n_batches = 0;

    for batch in dataset.batches(batch_size) {
        let predicted = model.predict(params, batch.x)?;
        total += misclassification_rate(predicted.view(), batch.y)?;
        n_batches += 1;
    }

    if n_batches == 0 {
        return Err(MlErr::EmptyDataset("dataset"));
    }

    Ok(total / n_batches as f32)
}
