use ndarray::{Array1, Array2, ArrayView2};

use super::activations::argmax_rows;
use crate::error::Result;

/// Name and shape of one of the tensors a model's flat parameter buffer is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSpec {
    pub name: &'static str,
    pub shape: Vec<usize>,
}

impl TensorSpec {
    pub fn new(name: &'static str, shape: Vec<usize>) -> Self {
        Self { name, shape }
    }

    /// Returns the amount of scalars in the tensor.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A pure computational model.
///
/// A `Model` defines how to evaluate a function and compute the gradient of its parameters.
/// It does not own parameters, they are handed to it as a flat slice on each call.
pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Returns the `(inputs, outputs)` dimension of the model.
    fn dim(&self) -> (usize, usize);

    /// Returns the tensors the flat parameter buffer is made of, in order.
    fn layout(&self) -> Vec<TensorSpec>;

    /// Computes the unnormalized class scores for a batch of inputs.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - A `N x inputs` batch.
    ///
    /// # Returns
    /// A `N x outputs` matrix of scores or an error if the shapes don't match.
    fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Writes into `grad` the gradient of the loss with respect to the parameters.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - A buffer with the same layout as `params`, it gets overwritten.
    /// * `x` - The batch that was forwarded.
    /// * `d` - The gradient of the loss with respect to the scores of `x`.
    fn backward(
        &self,
        params: &[f32],
        grad: &mut [f32],
        x: ArrayView2<f32>,
        d: ArrayView2<f32>,
    ) -> Result<()>;

    /// Returns the index of the highest scoring class for each row of `x`.
    fn predict(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array1<usize>> {
        let scores = self.forward(params, x)?;
        Ok(argmax_rows(scores.view()))
    }
}
