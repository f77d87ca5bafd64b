use std::env;

use anyhow::Context;
use env_logger::Env;
use log::{info, warn};

use machine_learning::{
    arch::{LogisticRegression, loss::NegativeLogLikelihood},
    data::{Splits, mnist, synthetic::Blobs},
    optimization::GradientDescent,
    training::{ModelTrainer, TrainingConfig, generate_rng},
};

const VALIDATION_SIZE: usize = 10_000;
const DEMO_SEED: u64 = 1234;
const DEFAULT_LOG_FILTER: &str = "info";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(log_env(env_logger::DEFAULT_FILTER_ENV)).init();

    let config = match env::args().nth(1) {
        Some(path) => TrainingConfig::from_json_file(&path)
            .with_context(|| format!("failed to load the training config from {path}"))?,
        None => TrainingConfig::default(),
    };

    let splits = load_splits()?;
    let model = LogisticRegression::new(splits.n_features(), splits.n_classes());
    info!(
        "training a logistic regression with {} inputs and {} classes",
        splits.n_features(),
        splits.n_classes()
    );

    let mut trainer = ModelTrainer::new(
        model,
        GradientDescent::new(config.learning_rate),
        NegativeLogLikelihood::new(),
        splits,
        &config,
        generate_rng(config.seed),
    )
    .context("failed to set up training")?;

    let report = trainer.train().context("training failed")?;

    println!("{report}");
    println!("best parameters written to {}", config.checkpoint.display());
    Ok(())
}

/// Logging configuration read from `filter_var`, showing the training progress when it's unset.
fn log_env(filter_var: &str) -> Env<'_> {
    Env::new()
        .filter_or(filter_var, DEFAULT_LOG_FILTER)
        .write_style(env_logger::DEFAULT_WRITE_STYLE_ENV)
}

fn load_splits() -> anyhow::Result<Splits> {
    match env::var("MNIST_DIR") {
        Ok(dir) => mnist::load(&dir, VALIDATION_SIZE)
            .with_context(|| format!("failed to load MNIST from {dir}")),
        Err(_) => {
            warn!("MNIST_DIR is not set, training on synthetic gaussian blobs instead");
            Blobs::new(1000, 4, 3.0, 1.0)
                .splits(DEMO_SEED)
                .context("failed to generate the synthetic dataset")
        }
    }
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;

    use super::*;

    #[test]
    fn progress_is_logged_by_default() {
        let logger = env_logger::Builder::from_env(log_env("LOGREG_TEST_UNSET_FILTER")).build();
        assert_eq!(logger.filter(), LevelFilter::Info);
    }
}
