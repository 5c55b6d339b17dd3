//! Trading state owned by the controller.

use chase_core::{ClientOrderId, OrderId, Price, Quantity};
use std::fmt;

/// Controller lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerPhase {
    #[default]
    Idle,
    PlacingInitial,
    Chasing,
    Cancelling,
    Repricing,
    Placing,
    Done,
    Aborted,
}

impl ControllerPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for ControllerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::PlacingInitial => "placing_initial",
            Self::Chasing => "chasing",
            Self::Cancelling => "cancelling",
            Self::Repricing => "repricing",
            Self::Placing => "placing",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// The order currently resting on the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveOrder {
    pub order_id: OrderId,
    pub client_order_id: ClientOrderId,
    pub price: Price,
    /// Whole units submitted.
    pub quantity: u64,
}

/// Mutable state of one chase run.
///
/// `current_price` only moves down and `remaining` only shrinks by fills
/// confirmed in cancel acknowledgements.
#[derive(Debug, Clone)]
pub struct TradingState {
    active_order: Option<ActiveOrder>,
    current_price: Price,
    remaining: Quantity,
    phase: ControllerPhase,
    reprices: u32,
}

impl TradingState {
    pub fn new(starting_price: Price, quantity: Quantity) -> Self {
        Self {
            active_order: None,
            current_price: starting_price,
            remaining: quantity,
            phase: ControllerPhase::Idle,
            reprices: 0,
        }
    }

    pub fn active_order(&self) -> Option<&ActiveOrder> {
        self.active_order.as_ref()
    }

    pub fn current_price(&self) -> Price {
        self.current_price
    }

    pub fn remaining(&self) -> Quantity {
        self.remaining
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// Accepted replacement orders so far.
    pub fn reprices(&self) -> u32 {
        self.reprices
    }

    /// Whether less than `min_quantity` is left to sell.
    pub fn is_exhausted(&self, min_quantity: Quantity) -> bool {
        self.remaining < min_quantity
    }

    pub(crate) fn set_phase(&mut self, phase: ControllerPhase) -> ControllerPhase {
        std::mem::replace(&mut self.phase, phase)
    }

    pub(crate) fn record_placement(&mut self, order: ActiveOrder) {
        self.active_order = Some(order);
    }

    pub(crate) fn record_reprice(&mut self) {
        self.reprices += 1;
    }

    /// Apply a confirmed cancel: drop the active order and deduct its fills.
    ///
    /// Returns the quantity actually deducted.
    pub(crate) fn record_cancel(&mut self, executed: Quantity) -> Quantity {
        self.active_order = None;
        let before = self.remaining;
        self.remaining = before.saturating_sub(executed);
        before - self.remaining
    }

    /// Move the working price to `price`, ignoring any increase.
    pub(crate) fn lower_price(&mut self, price: Price) -> Price {
        if price < self.current_price {
            self.current_price = price;
        }
        self.current_price
    }
}
