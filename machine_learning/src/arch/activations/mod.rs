mod softmax;

pub use softmax::{argmax_rows, log_softmax, softmax};
