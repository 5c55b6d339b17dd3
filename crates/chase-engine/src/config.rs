//! Controller configuration.

use chase_core::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Loop tuning; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseTuning {
    /// Pause between initial placement attempts while the exchange rejects.
    pub initial_retry_delay_ms: u64,
    /// Attempts per order book read.
    pub book_retry_attempts: u32,
    pub book_retry_delay_ms: u64,
    /// Pause between loop iterations; 0 polls back-to-back.
    pub poll_interval_ms: u64,
    /// Smallest tradable amount; the run completes below it.
    pub min_quantity: Quantity,
    /// Consecutive non-rate-limit rejections of a replacement before giving up.
    pub max_replacement_rejections: u32,
}

impl Default for ChaseTuning {
    fn default() -> Self {
        Self {
            initial_retry_delay_ms: 50,
            book_retry_attempts: 3,
            book_retry_delay_ms: 50,
            poll_interval_ms: 0,
            min_quantity: Quantity::ONE,
            max_replacement_rejections: 10,
        }
    }
}

impl ChaseTuning {
    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    pub fn book_retry_delay(&self) -> Duration {
        Duration::from_millis(self.book_retry_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Parameters of one chase run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaseConfig {
    pub symbol: String,
    pub sell_quantity: Quantity,
    pub starting_price: Price,
    /// Floor; no order is ever placed below it.
    pub min_sell_price: Price,
    /// Fractional bid drop below the order price that triggers a reprice.
    pub price_delta: Decimal,
    /// Fractional undercut below the fresh bid for replacement orders.
    pub limit_depth: Decimal,
    pub tuning: ChaseTuning,
}

impl ChaseConfig {
    pub fn new(
        symbol: impl Into<String>,
        sell_quantity: Quantity,
        starting_price: Price,
        min_sell_price: Price,
        price_delta: Decimal,
        limit_depth: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            sell_quantity,
            starting_price,
            min_sell_price,
            price_delta,
            limit_depth,
            tuning: ChaseTuning::default(),
        }
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: ChaseTuning) -> Self {
        self.tuning = tuning;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuning_partial_table_uses_defaults() {
        let tuning: ChaseTuning = serde_json::from_str(r#"{"poll_interval_ms": 250}"#).unwrap();
        assert_eq!(tuning.poll_interval(), Duration::from_millis(250));
        assert_eq!(tuning.book_retry_attempts, 3);
        assert_eq!(tuning.initial_retry_delay(), Duration::from_millis(50));
        assert_eq!(tuning.min_quantity, Quantity::ONE);
    }
}
