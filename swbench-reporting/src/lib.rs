mod error;
mod stats;

pub use error::*;
pub use stats::*;
