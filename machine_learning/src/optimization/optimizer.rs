use crate::Result;

pub trait Optimizer {
    /// Updates `params` in place given their gradient.
    ///
    /// # Errors
    /// Returns `MlErr::SizeMismatch` if `params` and `grad` have different lengths.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()>;
}
