//! Application configuration.

use crate::error::{AppError, AppResult};
use chase_core::{Price, Quantity};
use chase_engine::{ChaseConfig, ChaseTuning};
use chase_exchange::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `api_key`.
pub const API_KEY_ENV: &str = "CHASE_API_KEY";
/// Environment variable overriding `api_secret`.
pub const API_SECRET_ENV: &str = "CHASE_API_SECRET";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

/// Application configuration.
///
/// Field names are snake_case in TOML; the camelCase names of the legacy
/// JSON format are accepted as aliases.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// Trading pair, e.g. "ABCUSDT".
    pub symbol: String,
    #[serde(alias = "sellQuantity")]
    pub sell_quantity: Quantity,
    #[serde(alias = "startingPrice")]
    pub starting_price: Price,
    /// No order is ever placed below this price.
    #[serde(alias = "minSellPrice")]
    pub min_sell_price: Price,
    /// Fractional bid drop that triggers a reprice (e.g. 0.01 = 1%).
    #[serde(alias = "priceDelta")]
    pub price_delta: Decimal,
    /// Fractional undercut below the fresh bid for replacement orders.
    #[serde(alias = "limitDepth")]
    pub limit_depth: Decimal,
    /// Start time in epoch milliseconds. Absent: start immediately.
    #[serde(default, alias = "tradingStartTime")]
    pub trading_start_time: Option<i64>,
    #[serde(default, alias = "apiKey")]
    pub api_key: String,
    #[serde(default, alias = "apiSecret")]
    pub api_secret: String,
    #[serde(default = "default_base_url", alias = "baseUrl")]
    pub base_url: String,
    /// `recvWindow` sent with signed requests; exchange default if absent.
    #[serde(default, alias = "recvWindowMs")]
    pub recv_window_ms: Option<u64>,
    #[serde(default = "default_request_timeout_ms", alias = "requestTimeoutMs")]
    pub request_timeout_ms: u64,
    /// Controller tuning.
    #[serde(default)]
    pub chase: ChaseTuning,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("symbol", &self.symbol)
            .field("sell_quantity", &self.sell_quantity)
            .field("starting_price", &self.starting_price)
            .field("min_sell_price", &self.min_sell_price)
            .field("price_delta", &self.price_delta)
            .field("limit_depth", &self.limit_depth)
            .field("trading_start_time", &self.trading_start_time)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("recv_window_ms", &self.recv_window_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("chase", &self.chase)
            .finish()
    }
}

impl AppConfig {
    /// Read, apply environment overrides and validate.
    pub fn load(path: &str) -> AppResult<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a file; `.json` files use the JSON format, anything else TOML.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;

        let is_json = Path::new(path)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn from_json_str(content: &str) -> AppResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Replace credentials from `CHASE_API_KEY` / `CHASE_API_SECRET` when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_credential_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(API_SECRET_ENV).ok(),
        );
    }

    fn apply_credential_overrides(&mut self, api_key: Option<String>, api_secret: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api_key = key;
        }
        if let Some(secret) = api_secret.filter(|s| !s.is_empty()) {
            self.api_secret = secret;
        }
    }

    /// Reject configurations the controller cannot run safely.
    pub fn validate(&self) -> AppResult<()> {
        let invalid = |msg: String| -> AppResult<()> { Err(AppError::Config(msg)) };

        if self.symbol.trim().is_empty() {
            return invalid("symbol must not be empty".to_string());
        }
        if !self.symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return invalid(format!("symbol {:?} must be ASCII letters and digits", self.symbol));
        }
        if !self.starting_price.is_positive() || !self.min_sell_price.is_positive() {
            return invalid("starting_price and min_sell_price must be positive".to_string());
        }
        if self.starting_price < self.min_sell_price {
            return invalid(format!(
                "starting_price {} is below min_sell_price {}",
                self.starting_price, self.min_sell_price
            ));
        }
        if self.price_delta <= Decimal::ZERO || self.price_delta >= Decimal::ONE {
            return invalid(format!("price_delta {} must be in (0, 1)", self.price_delta));
        }
        if self.limit_depth < Decimal::ZERO || self.limit_depth >= Decimal::ONE {
            return invalid(format!("limit_depth {} must be in [0, 1)", self.limit_depth));
        }
        if self.chase.min_quantity < Quantity::ONE {
            return invalid(format!(
                "chase.min_quantity {} must be at least 1",
                self.chase.min_quantity
            ));
        }
        if self.sell_quantity < self.chase.min_quantity {
            return invalid(format!(
                "sell_quantity {} is below the minimum tradable quantity {}",
                self.sell_quantity, self.chase.min_quantity
            ));
        }
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return invalid(format!(
                "API credentials missing (set api_key/api_secret or {API_KEY_ENV}/{API_SECRET_ENV})"
            ));
        }
        Ok(())
    }

    /// Controller parameters for this run.
    pub fn chase_config(&self) -> ChaseConfig {
        ChaseConfig::new(
            self.symbol.clone(),
            self.sell_quantity,
            self.starting_price,
            self.min_sell_price,
            self.price_delta,
            self.limit_depth,
        )
        .with_tuning(self.chase.clone())
    }

    /// Scheduled start, if configured and representable.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.trading_start_time
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
