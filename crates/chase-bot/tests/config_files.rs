//! Loading configuration files from disk in both supported formats.

use chase_bot::{AppConfig, AppError};
use rust_decimal_macros::dec;
use std::path::PathBuf;

fn write_temp(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("chase-bot-{}-{name}", std::process::id()));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_toml_file_round_trips_into_controller_config() {
    let path = write_temp(
        "config.toml",
        r#"
        symbol = "ABCUSDT"
        sell_quantity = "250"
        starting_price = "1.5"
        min_sell_price = "1.2"
        price_delta = "0.01"
        limit_depth = "0.005"
        api_key = "key"
        api_secret = "secret"
        recv_window_ms = 5000

        [chase]
        book_retry_attempts = 5
        "#,
    );

    let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
    config.validate().unwrap();
    let chase = config.chase_config();

    assert_eq!(chase.sell_quantity.inner(), dec!(250));
    assert_eq!(chase.starting_price.inner(), dec!(1.5));
    assert_eq!(chase.tuning.book_retry_attempts, 5);
    assert_eq!(config.recv_window_ms, Some(5000));
    assert!(config.start_time().is_none());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_legacy_json_file() {
    let path = write_temp(
        "config.json",
        r#"{
            "symbol": "ABCBTC",
            "sellQuantity": 1000,
            "startingPrice": 0.00012,
            "minSellPrice": 0.0001,
            "priceDelta": 0.01,
            "limitDepth": 0.002,
            "tradingStartTime": 1700000000000,
            "apiKey": "key",
            "apiSecret": "secret"
        }"#,
    );

    let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.min_sell_price.inner(), dec!(0.0001));
    assert_eq!(config.start_time().unwrap().timestamp_millis(), 1_700_000_000_000);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_file_is_config_error() {
    let err = AppConfig::from_file("/nonexistent/chase.toml").unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn test_invalid_toml_is_config_error() {
    let path = write_temp("broken.toml", "symbol = ");
    let err = AppConfig::from_file(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    std::fs::remove_file(path).ok();
}
