//! Application error types.

use chase_engine::ControllerError;
use chase_exchange::ExchangeError;
use chase_telemetry::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Chase error: {0}")]
    Controller(#[from] ControllerError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run declined by operator")]
    Declined,

    #[error("Shutdown requested before start")]
    Shutdown,
}

pub type AppResult<T> = Result<T, AppError>;
