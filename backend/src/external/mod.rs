//! External API integrations

pub mod prediction;

pub use prediction::{PredictionClient, UpstreamHealth};
