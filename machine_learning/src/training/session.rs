use crate::Result;

/// The numerical side of a training run, driven by `EarlyStopping::run`.
///
/// The driver owns the control flow (epochs, validation schedule, patience) while a session
/// owns the parameters and the data.
pub trait Session {
    /// Returns the amount of minibatches in one pass over the train split.
    fn n_train_batches(&self) -> usize;

    /// Called before the first minibatch of every epoch, `epoch` starts at 1.
    fn begin_epoch(&mut self, _epoch: usize) -> Result<()> {
        Ok(())
    }

    /// Performs one optimization step on the `minibatch`-th train batch.
    ///
    /// # Returns
    /// The loss of the batch before the step.
    fn train_minibatch(&mut self, epoch: usize, minibatch: usize) -> Result<f32>;

    /// Called once the epoch is over, also when training stops in the middle of it.
    fn end_epoch(&mut self, _epoch: usize) -> Result<()> {
        Ok(())
    }

    /// Returns the current error on the validation split.
    fn validation_error(&mut self) -> Result<f32>;

    /// Returns the current error on the test split.
    fn test_error(&mut self) -> Result<f32>;

    /// Persists the current parameters as the best found so far.
    fn save_best(&mut self, iter: usize) -> Result<()>;
}
