//! Chase trigger and replacement pricing.
//!
//! Pure functions over [`Price`]; the controller owns when they run.

use chase_core::Price;
use rust_decimal::Decimal;
use std::fmt;

/// What to do with the resting order given the latest best bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaseDecision {
    /// Bid has not fallen far enough; keep the order.
    Hold,
    /// Bid fell far enough but the order already sits at the floor.
    AtFloor,
    /// Cancel and replace lower.
    Reprice,
}

impl fmt::Display for ChaseDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hold => write!(f, "hold"),
            Self::AtFloor => write!(f, "at_floor"),
            Self::Reprice => write!(f, "reprice"),
        }
    }
}

/// Chase condition: `best_bid <= current * (1 - price_delta)`.
pub fn evaluate_chase(
    best_bid: Price,
    current: Price,
    min_sell_price: Price,
    price_delta: Decimal,
) -> ChaseDecision {
    if best_bid > current.discounted(price_delta) {
        ChaseDecision::Hold
    } else if current <= min_sell_price {
        ChaseDecision::AtFloor
    } else {
        ChaseDecision::Reprice
    }
}

/// Price for the order that replaces one resting at `current`.
///
/// `fresh_bid * (1 - limit_depth)` truncated to wire precision, raised to
/// the floor, and never above `current`.
pub fn replacement_price(
    fresh_bid: Price,
    current: Price,
    min_sell_price: Price,
    limit_depth: Decimal,
) -> Price {
    let undercut = fresh_bid.discounted(limit_depth).truncate_to_wire();
    undercut.max(min_sell_price).min(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn p(value: Decimal) -> Price {
        Price::new(value)
    }

    #[test]
    fn test_trigger_is_inclusive() {
        // 100 * (1 - 0.01) = 99
        let decision = evaluate_chase(p(dec!(99)), p(dec!(100)), p(dec!(90)), dec!(0.01));
        assert_eq!(decision, ChaseDecision::Reprice);
    }

    #[test]
    fn test_hold_above_threshold() {
        let decision = evaluate_chase(p(dec!(99.01)), p(dec!(100)), p(dec!(90)), dec!(0.01));
        assert_eq!(decision, ChaseDecision::Hold);
    }

    #[test]
    fn test_at_floor_is_noop() {
        let decision = evaluate_chase(p(dec!(80)), p(dec!(90)), p(dec!(90)), dec!(0.01));
        assert_eq!(decision, ChaseDecision::AtFloor);
    }

    #[test]
    fn test_replacement_undercuts_fresh_bid() {
        let price = replacement_price(p(dec!(98)), p(dec!(100)), p(dec!(90)), dec!(0.005));
        assert_eq!(price.inner(), dec!(97.51));
    }

    #[test]
    fn test_replacement_clamped_to_floor() {
        let price = replacement_price(p(dec!(80)), p(dec!(100)), p(dec!(90)), dec!(0.005));
        assert_eq!(price.inner(), dec!(90));
    }

    #[test]
    fn test_replacement_never_rises_on_rebound() {
        // Bid bounced back above the resting price between trigger and re-poll.
        let price = replacement_price(p(dec!(120)), p(dec!(100)), p(dec!(90)), dec!(0.005));
        assert_eq!(price.inner(), dec!(100));
    }

    #[test]
    fn test_replacement_truncates_to_wire_precision() {
        let price = replacement_price(
            p(dec!(0.123456789)),
            p(dec!(1)),
            p(dec!(0.0000001)),
            dec!(0),
        );
        assert_eq!(price.inner(), dec!(0.12345678));
    }

    #[test]
    fn test_scenario_second_bid_does_not_trigger() {
        let repriced = replacement_price(p(dec!(98)), p(dec!(100)), p(dec!(90)), dec!(0.005));
        // 97.51 * 0.99 = 96.5349 < 98
        let decision = evaluate_chase(p(dec!(98)), repriced, p(dec!(90)), dec!(0.01));
        assert_eq!(decision, ChaseDecision::Hold);
    }
}
