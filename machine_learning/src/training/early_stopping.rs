use std::{num::NonZeroUsize, time::Instant};

use log::info;

use super::{Session, TrainingConfig, TrainingReport};
use crate::{MlErr, Result};

/// What a validation error meant to the stopping criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NoImprovement,
    /// Lower than the best so far, but not enough to extend the patience.
    Improved,
    /// Lower than `best * improvement_threshold`, the patience was extended.
    SignificantlyImproved,
}

impl Verdict {
    pub fn is_improvement(self) -> bool {
        self != Verdict::NoImprovement
    }
}

/// Patience based early stopping.
///
/// Training runs for at least `patience` minibatch iterations. Every significant improvement
/// of the validation error pushes the patience to `iter * patience_increase`, and training
/// stops as soon as the iteration count catches up with it.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    patience_increase: usize,
    improvement_threshold: f32,
    best_validation_error: f32,
    best_iter: Option<usize>,
}

impl EarlyStopping {
    /// Creates a new `EarlyStopping`.
    ///
    /// # Arguments
    /// * `patience` - The initial amount of iterations to run.
    /// * `patience_increase` - Multiplier of the iteration on a significant improvement.
    /// * `improvement_threshold` - The relative error a new best must be under to be significant.
    pub fn new(patience: usize, patience_increase: usize, improvement_threshold: f32) -> Self {
        Self {
            patience,
            patience_increase,
            improvement_threshold,
            best_validation_error: f32::INFINITY,
            best_iter: None,
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(
            config.patience,
            config.patience_increase,
            config.improvement_threshold,
        )
    }

    #[inline]
    pub fn patience(&self) -> usize {
        self.patience
    }

    #[inline]
    pub fn best_validation_error(&self) -> f32 {
        self.best_validation_error
    }

    #[inline]
    pub fn best_iter(&self) -> Option<usize> {
        self.best_iter
    }

    /// Returns how many minibatches pass between validations, at least one.
    pub fn validation_frequency(&self, n_train_batches: usize) -> usize {
        n_train_batches.min(self.patience / 2).max(1)
    }

    /// Whether iteration `iter` (0-based) is followed by a validation.
    pub fn should_validate(&self, iter: usize, frequency: usize) -> bool {
        (iter + 1) % frequency == 0
    }

    /// Records the validation error measured after iteration `iter`.
    pub fn observe(&mut self, iter: usize, error: f32) -> Verdict {
        if !(error < self.best_validation_error) {
            return Verdict::NoImprovement;
        }

        let verdict = if error < self.best_validation_error * self.improvement_threshold {
            self.patience = self.patience.max(iter * self.patience_increase);
            Verdict::SignificantlyImproved
        } else {
            Verdict::Improved
        };

        self.best_validation_error = error;
        self.best_iter = Some(iter);
        verdict
    }

    /// Whether training must stop after iteration `iter`.
    #[inline]
    pub fn should_stop(&self, iter: usize) -> bool {
        self.patience <= iter
    }

    /// Drives `session` for at most `n_epochs` epochs.
    ///
    /// Validates every `validation_frequency` iterations; each new best is followed by a test
    /// evaluation and a checkpoint. Stops when the patience runs out or the epochs do.
    pub fn run<S: Session>(
        &mut self,
        session: &mut S,
        n_epochs: NonZeroUsize,
    ) -> Result<TrainingReport> {
        let n_train_batches = session.n_train_batches();
        if n_train_batches == 0 {
            return Err(MlErr::EmptyDataset("train split"));
        }

        let frequency = self.validation_frequency(n_train_batches);
        let start = Instant::now();

        let mut test_error = None;
        let mut iterations = 0;
        let mut epochs = 0;
        let mut done = false;

        for epoch in 1..=n_epochs.get() {
            session.begin_epoch(epoch)?;
            epochs = epoch;

            for minibatch in 0..n_train_batches {
                let iter = (epoch - 1) * n_train_batches + minibatch;
                session.train_minibatch(epoch, minibatch)?;
                iterations = iter + 1;

                if self.should_validate(iter, frequency) {
                    let error = session.validation_error()?;
                    info!(
                        "epoch {epoch}, minibatch {}/{n_train_batches}, validation error {:.6} %",
                        minibatch + 1,
                        error * 100.0
                    );

                    if self.observe(iter, error).is_improvement() {
                        let error = session.test_error()?;
                        info!(
                            "     epoch {epoch}, minibatch {}/{n_train_batches}, test error of best model {:.6} %",
                            minibatch + 1,
                            error * 100.0
                        );

                        test_error = Some(error);
                        session.save_best(iter)?;
                    }
                }

                if self.should_stop(iter) {
                    done = true;
                    break;
                }
            }

            session.end_epoch(epoch)?;
            if done {
                break;
            }
        }

        let report = TrainingReport {
            best_validation_error: self.best_validation_error,
            test_error,
            best_iter: self.best_iter,
            iterations,
            epochs,
            elapsed: start.elapsed(),
        };

        info!("optimization complete: {report}");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed list of validation errors, repeating the last one.
    struct Scripted {
        n_batches: usize,
        errors: Vec<f32>,
        validations: usize,
        trained: usize,
        epochs_ended: Vec<usize>,
        checkpoints: Vec<usize>,
        fail_saves: bool,
    }

    impl Scripted {
        fn new(n_batches: usize, errors: &[f32]) -> Self {
            Self {
                n_batches,
                errors: errors.to_vec(),
                validations: 0,
                trained: 0,
                epochs_ended: Vec::new(),
                checkpoints: Vec::new(),
                fail_saves: false,
            }
        }
    }

    impl Session for Scripted {
        fn n_train_batches(&self) -> usize {
            self.n_batches
        }

        fn train_minibatch(&mut self, _epoch: usize, _minibatch: usize) -> Result<f32> {
            self.trained += 1;
            Ok(1.0)
        }

        fn end_epoch(&mut self, epoch: usize) -> Result<()> {
            self.epochs_ended.push(epoch);
            Ok(())
        }

        fn validation_error(&mut self) -> Result<f32> {
            let i = self.validations.min(self.errors.len() - 1);
            self.validations += 1;
            Ok(self.errors[i])
        }

        fn test_error(&mut self) -> Result<f32> {
            Ok(0.42)
        }

        fn save_best(&mut self, iter: usize) -> Result<()> {
            if self.fail_saves {
                return Err(MlErr::Checkpoint("disk full".into()));
            }

            self.checkpoints.push(iter);
            Ok(())
        }
    }

    fn epochs(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn validation_frequency_is_bounded_by_batches_and_patience() {
        assert_eq!(EarlyStopping::new(5000, 2, 0.995).validation_frequency(100), 100);
        assert_eq!(EarlyStopping::new(10, 2, 0.995).validation_frequency(100), 5);
        assert_eq!(EarlyStopping::new(1, 2, 0.995).validation_frequency(100), 1);
    }

    #[test]
    fn observe_classifies_improvements() {
        let mut stopping = EarlyStopping::new(20, 2, 0.995);

        assert_eq!(stopping.observe(9, 0.5), Verdict::SignificantlyImproved);
        assert_eq!(stopping.patience(), 20);

        assert_eq!(stopping.observe(19, 0.3), Verdict::SignificantlyImproved);
        assert_eq!(stopping.patience(), 38);

        assert_eq!(stopping.observe(29, 0.299), Verdict::Improved);
        assert_eq!(stopping.patience(), 38);
        assert_eq!(stopping.best_iter(), Some(29));

        assert_eq!(stopping.observe(39, 0.299), Verdict::NoImprovement);
        assert_eq!(stopping.observe(49, f32::NAN), Verdict::NoImprovement);
        assert_eq!(stopping.best_validation_error(), 0.299);
    }

    #[test]
    fn significant_improvements_extend_the_run() {
        let mut session = Scripted::new(10, &[0.5, 0.3, 0.29]);
        let mut stopping = EarlyStopping::new(20, 2, 0.995);

        let report = stopping.run(&mut session, epochs(1000)).unwrap();

        // patience goes 20 -> 38 -> 58, so the run stops right after iteration 58
        assert_eq!(report.iterations, 59);
        assert_eq!(report.epochs, 6);
        assert_eq!(session.trained, 59);
        assert_eq!(session.validations, 5);
        assert_eq!(session.checkpoints, [9, 19, 29]);
        assert_eq!(session.epochs_ended, [1, 2, 3, 4, 5, 6]);
        assert_eq!(report.best_iter, Some(29));
        assert_eq!(report.best_validation_error, 0.29);
        assert_eq!(report.test_error, Some(0.42));
    }

    #[test]
    fn small_improvements_are_checkpointed_without_more_patience() {
        let mut session = Scripted::new(10, &[0.5, 0.3, 0.299]);
        let mut stopping = EarlyStopping::new(20, 2, 0.995);

        let report = stopping.run(&mut session, epochs(1000)).unwrap();

        assert_eq!(report.iterations, 39);
        assert_eq!(report.epochs, 4);
        assert_eq!(session.validations, 3);
        assert_eq!(session.checkpoints, [9, 19, 29]);
    }

    #[test]
    fn stops_after_the_last_epoch() {
        let errors: Vec<f32> = (0..10).map(|i| 1.0 / (i + 1) as f32).collect();
        let mut session = Scripted::new(3, &errors);
        let mut stopping = EarlyStopping::new(1000, 2, 0.995);

        let report = stopping.run(&mut session, epochs(2)).unwrap();

        assert_eq!(report.iterations, 6);
        assert_eq!(report.epochs, 2);
        assert_eq!(session.validations, 2);
        assert_eq!(session.checkpoints, [2, 5]);
        assert_eq!(session.epochs_ended, [1, 2]);
    }

    #[test]
    fn a_failed_checkpoint_aborts_training() {
        let mut session = Scripted::new(10, &[0.5]);
        session.fail_saves = true;
        let mut stopping = EarlyStopping::new(20, 2, 0.995);

        let result = stopping.run(&mut session, epochs(1000));

        assert!(matches!(result, Err(MlErr::Checkpoint(_))));
        assert_eq!(session.trained, 10);
        assert_eq!(session.validations, 1);
        assert!(session.epochs_ended.is_empty());
    }

    #[test]
    fn a_session_without_batches_is_an_error() {
        let mut session = Scripted::new(0, &[0.5]);
        let mut stopping = EarlyStopping::new(10, 2, 0.995);

        assert!(matches!(
            stopping.run(&mut session, epochs(1)),
            Err(MlErr::EmptyDataset(_))
        ));
    }
}
