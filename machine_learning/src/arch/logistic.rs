use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis, linalg};

use super::{Model, TensorSpec, activations::softmax};
use crate::{MlErr, Result};

/// Multiclass logistic regression: `softmax(x · W + b)`.
///
/// The parameters are laid out as `W` (`n_in x n_out`, row major) followed by `b` (`n_out`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogisticRegression {
    dim: (usize, usize),
    size: usize,
}

impl LogisticRegression {
    /// Creates a new `LogisticRegression`.
    ///
    /// # Arguments
    /// * `n_in` - The amount of input features.
    /// * `n_out` - The amount of classes.
    ///
    /// # Returns
    /// A new `LogisticRegression` instance.
    pub fn new(n_in: usize, n_out: usize) -> Self {
        Self {
            dim: (n_in, n_out),
            size: (n_in + 1) * n_out,
        }
    }

    /// Computes the class membership probabilities of each row of `x`.
    pub fn predict_proba(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let scores = self.forward(params, x)?;
        Ok(softmax(scores.view()))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this model.
    ///
    /// # Arguments
    /// * `params` - A slice of parameters.
    ///
    /// # Returns
    /// A tuple containing the weights and biases.
    pub fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        self.check_len("params", params.len())?;

        let (w_raw, b_raw) = params.split_at(self.size - self.dim.1);
        let weights = ArrayView2::from_shape(self.dim, w_raw)?;
        let biases = ArrayView1::from_shape(self.dim.1, b_raw)?;
        Ok((weights, biases))
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this model.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        self.check_len("grad", grad.len())?;

        let (dw_raw, db_raw) = grad.split_at_mut(self.size - self.dim.1);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw)?;
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw)?;
        Ok((dw, db))
    }

    fn check_len(&self, what: &'static str, got: usize) -> Result<()> {
        if got != self.size {
            return Err(MlErr::SizeMismatch {
                what,
                got,
                expected: self.size,
            });
        }

        Ok(())
    }
}

impl Model for LogisticRegression {
    fn size(&self) -> usize {
        self.size
    }

    fn dim(&self) -> (usize, usize) {
        self.dim
    }

    fn layout(&self) -> Vec<TensorSpec> {
        let (n_in, n_out) = self.dim;
        vec![
            TensorSpec::new("W", vec![n_in, n_out]),
            TensorSpec::new("b", vec![n_out]),
        ]
    }

    fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "input features",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;
        Ok(x.dot(&w) + &b)
    }

    fn backward(
        &self,
        _params: &[f32],
        grad: &mut [f32],
        x: ArrayView2<f32>,
        d: ArrayView2<f32>,
    ) -> Result<()> {
        if d.dim() != (x.nrows(), self.dim.1) {
            return Err(MlErr::SizeMismatch {
                what: "score gradient rows",
                got: d.nrows(),
                expected: x.nrows(),
            });
        }

        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &x.t(), &d, 0.0, &mut dw);
        db.assign(&d.sum_axis(Axis(0)));
        Ok(())
    }
}
