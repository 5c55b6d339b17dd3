//! Sell-order chaser application.
//!
//! Loads configuration, asks the operator to confirm, waits for the
//! scheduled start and runs the chase controller against the exchange.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
