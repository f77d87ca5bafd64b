mod dataset;
pub mod mnist;
mod splits;
pub mod synthetic;

pub use dataset::{BatchRef, Batches, Dataset};
pub use splits::{Split, Splits};
