//! Prediction contract models

mod district;
mod envelope;
mod prediction;

pub use district::*;
pub use envelope::*;
pub use prediction::*;
