//! Business logic services for the PM2.5 dashboard

pub mod dashboard;

pub use dashboard::{Clock, DashboardService, DashboardState, RankingResponse, ValidationInput};
