//! Application orchestration.
//!
//! Wires configuration, the signed REST client and the chase controller:
//! - Operator confirmation of the order parameters
//! - Countdown to the scheduled start
//! - Ctrl-C handling (abort before start, best-effort cancel during the run)
//! - Final summary and metrics dump

use crate::config::AppConfig;
use crate::error::AppResult;
use chase_engine::{ChaseController, ControllerError, RunSummary};
use chase_exchange::{BinanceClient, Credentials, RateLimited, RequestSigner};
use chase_telemetry::Metrics;
use chrono::{DateTime, Local, Utc};
use std::io::{BufRead, Write};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    shutdown: CancellationToken,
}

impl Application {
    /// Create a new application from a validated configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Token cancelled on Ctrl-C.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel the shutdown token on the first Ctrl-C.
    pub fn spawn_signal_handler(&self) {
        let token = self.shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown signal received");
                    token.cancel();
                }
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
        });
    }

    /// Human-readable summary of what is about to be traded.
    pub fn order_summary(&self) -> String {
        let c = &self.config;
        let start = match c.start_time() {
            Some(start) => start.with_timezone(&Local).to_rfc3339(),
            None => "immediately".to_string(),
        };
        format!(
            "Symbol:          {}\n\
             Sell quantity:   {}\n\
             Starting price:  {}\n\
             Min sell price:  {}\n\
             Price delta:     {}\n\
             Limit depth:     {}\n\
             Start:           {}\n\
             Endpoint:        {}\n",
            c.symbol,
            c.sell_quantity,
            c.starting_price.to_wire(),
            c.min_sell_price.to_wire(),
            c.price_delta,
            c.limit_depth,
            start,
            c.base_url
        )
    }

    /// Print the summary and ask for a `y`/`yes` answer.
    pub fn confirm<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> AppResult<bool> {
        write!(output, "{}\nPlace these orders? [y/N] ", self.order_summary())?;
        output.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }

    /// Sleep until the configured start time, logging a countdown.
    ///
    /// Returns `false` if shutdown was requested while waiting.
    pub async fn wait_for_start(&self) -> bool {
        let Some(start) = self.config.start_time() else {
            return !self.shutdown.is_cancelled();
        };

        info!(start = %start.with_timezone(&Local), "Trading scheduled");
        let delay = delay_until(start, Utc::now());
        wait_with_countdown(Instant::now() + delay, &self.shutdown).await
    }

    /// Run the chase against the live exchange.
    pub async fn run(self) -> AppResult<RunSummary> {
        let credentials =
            Credentials::new(self.config.api_key.clone(), self.config.api_secret.clone())?;
        let signer = RequestSigner::new(credentials, self.config.recv_window_ms);
        let client = BinanceClient::new(
            self.config.base_url.clone(),
            signer,
            self.config.request_timeout(),
        )?;
        let exchange = RateLimited::new(client);

        let mut controller =
            ChaseController::with_shutdown(self.config.chase_config(), exchange, self.shutdown);

        match controller.run().await {
            Ok(summary) => {
                match Metrics::render() {
                    Ok(text) => debug!(metrics = %text, "Final metrics"),
                    Err(e) => warn!(error = %e, "Failed to render metrics"),
                }
                Ok(summary)
            }
            Err(e) => {
                log_reconciliation(&e);
                Err(e.into())
            }
        }
    }
}

/// Log what an operator needs to reconcile after a fatal error.
fn log_reconciliation(err: &ControllerError) {
    if let Some(context) = err.context() {
        error!(
            symbol = %context.symbol,
            order_id = ?context.order_id,
            client_order_id = ?context.client_order_id.as_ref().map(|id| id.as_str()),
            remaining = %context.remaining,
            price = %context.price,
            "Reconcile manually against the account's order history"
        );
    }
}

/// Time left until `start`; zero if it already passed.
pub fn delay_until(start: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (start - now).to_std().unwrap_or(Duration::ZERO)
}

/// Countdown cadence: coarse when far away, every second at the end.
pub fn countdown_step(remaining: Duration) -> Duration {
    const MINUTE: u64 = 60;
    let secs = remaining.as_secs();
    let step = if secs >= 60 * MINUTE {
        15 * MINUTE
    } else if secs >= 10 * MINUTE {
        5 * MINUTE
    } else if secs >= MINUTE {
        30
    } else if secs >= 10 {
        5
    } else {
        1
    };
    Duration::from_secs(step)
}

/// Wait until `deadline`, logging the time left at each step.
///
/// Returns `false` if `shutdown` fired first.
pub async fn wait_with_countdown(deadline: Instant, shutdown: &CancellationToken) -> bool {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return !shutdown.is_cancelled();
        }

        let remaining = deadline - now;
        info!(remaining_secs = remaining.as_secs(), "Waiting for trading start");
        let step = countdown_step(remaining).min(remaining);

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Shutdown before trading start");
                return false;
            }
            _ = tokio::time::sleep(step) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn app() -> Application {
        let config = AppConfig::from_toml_str(
            r#"
            symbol = "ABCUSDT"
            sell_quantity = "1000"
            starting_price = "100"
            min_sell_price = "90"
            price_delta = "0.01"
            limit_depth = "0.005"
            api_key = "key"
            api_secret = "secret"
            "#,
        )
        .unwrap();
        Application::new(config).unwrap()
    }

    #[test]
    fn test_confirm_accepts_yes() {
        let app = app();
        let mut out = Vec::new();
        assert!(app.confirm("y\n".as_bytes(), &mut out).unwrap());
        assert!(app.confirm("YES\n".as_bytes(), &mut out).unwrap());

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("ABCUSDT"));
        assert!(printed.contains("100.00000000"));
    }

    #[test]
    fn test_confirm_defaults_to_no() {
        let app = app();
        assert!(!app.confirm("\n".as_bytes(), Vec::new()).unwrap());
        assert!(!app.confirm("maybe\n".as_bytes(), Vec::new()).unwrap());
    }

    #[test]
    fn test_delay_until_past_start_is_zero() {
        let now = Utc::now();
        assert_eq!(delay_until(now - chrono::Duration::seconds(5), now), Duration::ZERO);
        assert_eq!(
            delay_until(now + chrono::Duration::seconds(5), now),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_countdown_step_shrinks() {
        assert_eq!(countdown_step(Duration::from_secs(7200)), Duration::from_secs(900));
        assert_eq!(countdown_step(Duration::from_secs(90)), Duration::from_secs(30));
        assert_eq!(countdown_step(Duration::from_secs(3)), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_waits_until_deadline() {
        let token = CancellationToken::new();
        let started = Instant::now();

        assert!(wait_with_countdown(started + Duration::from_secs(125), &token).await);
        assert_eq!(started.elapsed(), Duration::from_secs(125));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_aborts_on_shutdown() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        assert!(!wait_with_countdown(started + Duration::from_secs(3600), &token).await);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_unscheduled_start_is_immediate() {
        assert!(app().wait_for_start().await);
    }
}
