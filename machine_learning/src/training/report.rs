use std::{fmt, time::Duration};

/// The outcome of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Lowest validation error seen, `f32::INFINITY` if no validation ran.
    pub best_validation_error: f32,
    /// Test error of the parameters that achieved `best_validation_error`.
    pub test_error: Option<f32>,
    /// Iteration at which `best_validation_error` was reached.
    pub best_iter: Option<usize>,
    /// Minibatch iterations run.
    pub iterations: usize,
    /// Epochs started, the last one may have been cut short.
    pub epochs: usize,
    pub elapsed: Duration,
}

impl TrainingReport {
    pub fn epochs_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.epochs as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "best validation error {:.6} %",
            self.best_validation_error * 100.0
        )?;

        if let (Some(test_error), Some(iter)) = (self.test_error, self.best_iter) {
            write!(f, " at iteration {}, test error {:.6} %", iter + 1, test_error * 100.0)?;
        }

        write!(
            f,
            "; ran {} epochs ({} iterations) in {:.1}s, {:.6} epochs/sec",
            self.epochs,
            self.iterations,
            self.elapsed.as_secs_f64(),
            self.epochs_per_sec()
        )
    }
}
