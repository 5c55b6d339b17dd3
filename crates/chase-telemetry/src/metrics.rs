//! Prometheus metrics for the chaser.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_int_counter, CounterVec, Encoder, Gauge,
    IntCounter, TextEncoder,
};

/// Orders submitted, by outcome.
/// Labels: kind (initial/replacement), outcome (accepted/rejected/failed)
pub static ORDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "chase_orders_total",
        "Total order placements by kind and outcome",
        &["kind", "outcome"]
    )
    .unwrap()
});

/// Cancels issued, by outcome.
pub static CANCELS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "chase_cancels_total",
        "Total cancel requests by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Completed reprice cycles.
pub static REPRICES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("chase_reprices_total", "Total completed reprice cycles").unwrap()
});

/// Responses carrying a 429/418 rate-limit status.
pub static RATE_LIMITED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "chase_rate_limited_total",
        "Total rate-limited exchange responses",
        &["status"]
    )
    .unwrap()
});

/// Order book reads that failed after retries.
pub static BOOK_READ_FAILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "chase_book_read_failed_total",
        "Order book polls that produced no usable bid"
    )
    .unwrap()
});

/// Price of the resting (or next) order.
pub static ORDER_PRICE: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("chase_order_price", "Current order limit price").unwrap());

/// Quantity not yet filled.
pub static REMAINING_QUANTITY: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("chase_remaining_quantity", "Quantity not yet filled").unwrap()
});

/// Last observed best bid.
pub static BEST_BID: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("chase_best_bid", "Last observed best bid").unwrap());

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record an order placement attempt.
    pub fn order_placed(kind: &str, outcome: &str) {
        ORDERS_TOTAL.with_label_values(&[kind, outcome]).inc();
    }

    /// Record a cancel attempt.
    pub fn order_cancelled(outcome: &str) {
        CANCELS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record a completed reprice cycle.
    pub fn reprice_completed() {
        REPRICES_TOTAL.inc();
    }

    /// Record a rate-limited response.
    pub fn rate_limited(status: u16) {
        RATE_LIMITED_TOTAL
            .with_label_values(&[&status.to_string()])
            .inc();
    }

    pub fn book_read_failed() {
        BOOK_READ_FAILED_TOTAL.inc();
    }

    /// Update the price/quantity gauges.
    pub fn order_state(price: f64, remaining: f64) {
        ORDER_PRICE.set(price);
        REMAINING_QUANTITY.set(remaining);
    }

    pub fn best_bid(price: f64) {
        BEST_BID.set(price);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
