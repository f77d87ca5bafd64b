mod config;
mod early_stopping;
mod report;
mod session;
mod trainer;

pub use config::TrainingConfig;
pub use early_stopping::{EarlyStopping, Verdict};
pub use report::TrainingReport;
pub use session::Session;
pub use trainer::{ModelTrainer, generate_rng};
