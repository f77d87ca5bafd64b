use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{EarlyStopping, Session, TrainingConfig, TrainingReport};
use crate::{
    MlErr, Result,
    arch::{Model, loss::LossFn},
    checkpoint,
    data::{Split, Splits},
    eval,
    optimization::Optimizer,
};

/// Returns a seeded generator, or one seeded from the OS if there's no `seed`.
pub fn generate_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// A model `Trainer`. Owns the parameters being learnt together with everything needed to
/// learn them: the model, the optimizer, the loss and the data.
pub struct ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    model: M,
    optimizer: O,
    loss_fn: L,
    splits: Splits,

    params: Vec<f32>,
    grad: Vec<f32>,

    config: TrainingConfig,
    rng: R,

    epoch_loss: f32,
    epoch_batches: usize,
}

impl<M, O, L, R> ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `ModelTrainer` with every parameter set to zero.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `optimizer` - The rule used to update the parameters.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    /// * `splits` - The train, validation and test data.
    /// * `config` - The training hyperparameters.
    /// * `rng` - A random number generator, used to shuffle the train split.
    ///
    /// # Returns
    /// A new trainer or an error if the config is invalid or the model doesn't fit the data.
    pub fn new(
        model: M,
        optimizer: O,
        loss_fn: L,
        splits: Splits,
        config: &TrainingConfig,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;

        let (n_in, n_out) = model.dim();
        if n_in != splits.n_features() {
            return Err(MlErr::SizeMismatch {
                what: "model inputs",
                got: n_in,
                expected: splits.n_features(),
            });
        }

        if n_out != splits.n_classes() {
            return Err(MlErr::SizeMismatch {
                what: "model outputs",
                got: n_out,
                expected: splits.n_classes(),
            });
        }

        let size = model.size();

        Ok(Self {
            model,
            optimizer,
            loss_fn,
            splits,
            params: vec![0.0; size],
            grad: vec![0.0; size],
            config: config.clone(),
            rng,
            epoch_loss: 0.0,
            epoch_batches: 0,
        })
    }

    /// Trains the model from zeroed parameters until the patience or the epochs run out.
    ///
    /// Every call is an independent run. The best parameters end up in the checkpoint file,
    /// `params` holds the last ones.
    pub fn train(&mut self) -> Result<TrainingReport> {
        self.params.fill(0.0);

        let mut stopping = EarlyStopping::from_config(&self.config);
        let n_epochs = self.config.n_epochs;
        stopping.run(self, n_epochs)
    }

    #[inline]
    pub fn params(&self) -> &[f32] {
        &self.params
    }

    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }

    #[inline]
    pub fn splits(&self) -> &Splits {
        &self.splits
    }

    fn error_on(&self, split: Split) -> Result<f32> {
        eval::mean_error(
            &self.model,
            &self.params,
            self.splits.get(split),
            self.config.batch_size,
        )
    }
}

impl<M, O, L, R> Session for ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    fn n_train_batches(&self) -> usize {
        self.splits.get(Split::Train).n_batches(self.config.batch_size)
    }

    fn begin_epoch(&mut self, _epoch: usize) -> Result<()> {
        if self.config.shuffle {
            self.splits.get_mut(Split::Train).shuffle(&mut self.rng);
        }

        self.epoch_loss = 0.0;
        self.epoch_batches = 0;
        Ok(())
    }

    fn train_minibatch(&mut self, epoch: usize, minibatch: usize) -> Result<f32> {
        let train = self.splits.get(Split::Train);
        let batch = train
            .batch(minibatch, self.config.batch_size)
            .ok_or_else(|| MlErr::DataExhausted {
                minibatch,
                available: train.n_batches(self.config.batch_size),
            })?;

        let scores = self.model.forward(&self.params, batch.x)?;
        let loss = self.loss_fn.loss(scores.view(), batch.y);
        if !loss.is_finite() {
            return Err(MlErr::NonFinite {
                what: "loss",
                epoch,
                minibatch,
            });
        }

        let d = self.loss_fn.loss_prime(scores.view(), batch.y);
        self.model
            .backward(&self.params, &mut self.grad, batch.x, d.view())?;

        if self.grad.iter().any(|g| !g.is_finite()) {
            return Err(MlErr::NonFinite {
                what: "gradient",
                epoch,
                minibatch,
            });
        }

        self.optimizer.update_params(&mut self.params, &self.grad)?;

        self.epoch_loss += loss;
        self.epoch_batches += 1;
        Ok(loss)
    }

    fn end_epoch(&mut self, epoch: usize) -> Result<()> {
        if self.epoch_batches > 0 {
            let loss = self.epoch_loss / self.epoch_batches as f32;
            debug!(epoch = epoch, loss = loss; "epoch finished");
        }

        Ok(())
    }

    fn validation_error(&mut self) -> Result<f32> {
        self.error_on(Split::Valid)
    }

    fn test_error(&mut self) -> Result<f32> {
        self.error_on(Split::Test)
    }

    fn save_best(&mut self, iter: usize) -> Result<()> {
        checkpoint::save(&self.config.checkpoint, &self.model.layout(), &self.params)?;
        debug!(iter = iter; "saved best parameters");
        Ok(())
    }
}
