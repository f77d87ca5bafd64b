pub mod arch;
pub mod checkpoint;
pub mod data;
pub mod error;
pub mod eval;
pub mod optimization;
pub mod training;

pub use error::{MlErr, Result};
