//! Controller error types.
//!
//! Every variant is fatal: the run stops and issues no further exchange
//! calls. Each carries enough context to reconcile against the account's
//! order history by hand.

use chase_core::{ClientOrderId, CoreError, OrderId, Price, Quantity};
use chase_exchange::{ApiError, ExchangeError};
use std::fmt;
use thiserror::Error;

/// What the controller knew when it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileContext {
    pub symbol: String,
    pub order_id: Option<OrderId>,
    pub client_order_id: Option<ClientOrderId>,
    pub remaining: Quantity,
    pub price: Price,
}

impl fmt::Display for ReconcileContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "symbol={}", self.symbol)?;
        if let Some(id) = self.order_id {
            write!(f, " order_id={id}")?;
        }
        if let Some(id) = &self.client_order_id {
            write!(f, " client_order_id={id}")?;
        }
        write!(f, " remaining={} price={}", self.remaining, self.price)
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    /// The order may already be filled or cancelled.
    #[error("Cancel rejected ({error}); order state unknown [{context}]")]
    CancelRejected {
        error: ApiError,
        context: ReconcileContext,
    },

    #[error("Cancel outcome unknown: {source} [{context}]")]
    CancelFailed {
        source: ExchangeError,
        context: ReconcileContext,
    },

    /// The order may or may not be resting.
    #[error("Placement outcome unknown: {source} [{context}]")]
    PlacementFailed {
        source: ExchangeError,
        context: ReconcileContext,
    },

    #[error("Placement rejected {attempts} times in a row ({error}) [{context}]")]
    PlacementRejected {
        error: ApiError,
        attempts: u32,
        context: ReconcileContext,
    },

    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] CoreError),
}

impl ControllerError {
    pub fn context(&self) -> Option<&ReconcileContext> {
        match self {
            Self::CancelRejected { context, .. }
            | Self::CancelFailed { context, .. }
            | Self::PlacementFailed { context, .. }
            | Self::PlacementRejected { context, .. } => Some(context),
            Self::InvalidOrder(_) => None,
        }
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;
