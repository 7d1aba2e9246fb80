mod config;
mod error;
mod global;
mod scenario;

pub use config::*;
pub use error::*;
pub use global::*;
pub use scenario::*;
