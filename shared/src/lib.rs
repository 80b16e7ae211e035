//! Shared types and logic for the PM2.5 district dashboard
//!
//! This crate contains everything the backend-for-frontend and the browser
//! (via WASM) agree on: the prediction result contract, the request validator,
//! the air-quality tier classifier and the view models built from a result.

pub mod analytics;
pub mod models;
pub mod session;
pub mod tier;
pub mod types;
pub mod validation;
pub mod views;

pub use analytics::*;
pub use models::*;
pub use session::*;
pub use tier::*;
pub use types::*;
pub use validation::*;
pub use views::*;
