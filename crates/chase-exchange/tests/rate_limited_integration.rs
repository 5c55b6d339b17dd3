//! Integration tests for the rate-limit wrapper over a scripted exchange.

use std::sync::Arc;
use std::time::Duration;

use chase_core::{OrderId, OrderSpec, Price, Quantity};
use chase_exchange::{ExchangeApi, MockCall, MockExchange, RateLimited};
use rust_decimal_macros::dec;
use tokio::time::Instant;
use tokio_test::assert_ok;

/// A 429 with `Retry-After: 2` delays the next call by exactly two seconds.
#[tokio::test(start_paused = true)]
async fn test_next_call_waits_for_retry_after() {
    let mock = Arc::new(MockExchange::new());
    mock.push_book_rate_limited(429, Duration::from_secs(2))
        .push_bid(Price::new(dec!(99)));
    let exchange = RateLimited::new(mock.clone());

    let limited = assert_ok!(exchange.get_order_book("ABCUSDT").await);
    assert!(limited.is_rate_limited());

    let before = Instant::now();
    let next = assert_ok!(exchange.get_order_book("ABCUSDT").await);
    let waited = before.elapsed();

    assert!(!next.is_rejected());
    assert!(waited >= Duration::from_millis(2_000));
    assert!(waited < Duration::from_millis(2_005));
}

/// The deadline applies to every call kind, not just the one that hit it.
#[tokio::test(start_paused = true)]
async fn test_deadline_is_shared_across_endpoints() {
    let mock = Arc::new(MockExchange::new());
    mock.push_book_rate_limited(418, Duration::from_secs(5));
    mock.push_cancel_ok(7, Quantity::ZERO);
    let exchange = RateLimited::new(mock.clone());

    assert_ok!(exchange.get_order_book("ABCUSDT").await);

    let before = Instant::now();
    assert_ok!(exchange.cancel_order("ABCUSDT", OrderId(7)).await);
    assert!(before.elapsed() >= Duration::from_secs(5));

    // A normal response clears the deadline.
    assert!(exchange.backoff().delay_until().is_none());
    assert_eq!(mock.calls().len(), 2);
}

/// Without a rate-limit signal calls go straight through.
#[tokio::test(start_paused = true)]
async fn test_no_delay_without_rate_limit() {
    let mock = Arc::new(MockExchange::new());
    mock.push_place_rejected(-1013, "Filter failure: PRICE_FILTER")
        .push_place_ok(11);
    let exchange = RateLimited::new(mock.clone());

    let order = OrderSpec::limit_sell("ABCUSDT")
        .request(Price::new(dec!(100)), Quantity::new(dec!(10)))
        .unwrap();

    let before = Instant::now();
    let first = assert_ok!(exchange.place_order(&order).await);
    let second = assert_ok!(exchange.place_order(&order).await);

    assert!(first.is_rejected());
    assert_eq!(second.into_result().unwrap().order_id, OrderId(11));
    assert_eq!(before.elapsed(), Duration::ZERO);
    assert!(mock.calls().iter().all(MockCall::is_place));
}
