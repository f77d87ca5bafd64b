use ndarray::{Array2, ArrayView1, ArrayView2};

/// A loss over unnormalized class scores and integer labels.
pub trait LossFn {
    /// Returns the mean loss of the batch.
    fn loss(&self, scores: ArrayView2<f32>, labels: ArrayView1<usize>) -> f32;

    /// Returns the gradient of `loss` with respect to `scores`.
    fn loss_prime(&self, scores: ArrayView2<f32>, labels: ArrayView1<usize>) -> Array2<f32>;
}
