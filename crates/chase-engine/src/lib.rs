//! Sell-order chase engine.
//!
//! # Key Components
//!
//! - [`ChaseController`]: owns the trading state and runs the chase loop
//! - [`TradingState`] / [`ControllerPhase`]: resting order, price, remaining quantity
//! - [`evaluate_chase`] / [`replacement_price`]: trigger and repricing rules
//! - [`attempt`] / [`RetryPolicy`]: retry combinator with cancellable pauses
//!
//! # Loop Step (in `ChaseController::run`)
//!
//! 1. Shutdown requested -> best-effort cancel, stop
//! 2. Remaining below minimum unit -> stop (completed)
//! 3. No active order -> place replacement
//! 4. Poll best bid -> Hold | AtFloor | Reprice (cancel, fill-read, re-poll, place)

pub mod config;
pub mod controller;
pub mod error;
pub mod pricing;
pub mod retry;
pub mod state;

pub use config::{ChaseConfig, ChaseTuning};
pub use controller::{ChaseController, RunOutcome, RunSummary};
pub use error::{ControllerError, ControllerResult, ReconcileContext};
pub use pricing::{evaluate_chase, replacement_price, ChaseDecision};
pub use retry::{attempt, Attempted, RetryPolicy};
pub use state::{ActiveOrder, ControllerPhase, TradingState};
