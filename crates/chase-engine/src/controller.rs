//! Order lifecycle controller.
//!
//! Owns the [`TradingState`] of one run and drives the chase loop:
//!
//! 1. Place the starting order, retrying exchange rejections until accepted
//! 2. Poll the best bid and evaluate the chase condition
//! 3. On a trigger: cancel, deduct confirmed fills, re-poll, place lower
//! 4. Repeat until the remaining quantity drops below the minimum tradable
//!    unit or shutdown is requested
//!
//! Exchange calls are strictly sequential; the controller never has two
//! requests in flight. Shutdown is observed between calls, never by
//! aborting one.

use crate::config::ChaseConfig;
use crate::error::{ControllerError, ControllerResult, ReconcileContext};
use crate::pricing::{self, ChaseDecision};
use crate::retry::{attempt, RetryPolicy};
use crate::state::{ActiveOrder, ControllerPhase, TradingState};
use chase_core::{ClientOrderId, OrderRequest, OrderSpec, Price, Quantity};
use chase_exchange::{
    ApiError, ApiResponse, ExchangeApi, ExchangeError, ExchangeResult, OrderAck, Outcome,
};
use chase_telemetry::Metrics;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

const KIND_INITIAL: &str = "initial";
const KIND_REPLACEMENT: &str = "replacement";

// ============================================================================
// RunSummary
// ============================================================================

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Less than the minimum tradable quantity remains.
    Completed,
    /// Shutdown was requested.
    ShutDown,
}

/// Final state of a run that ended without a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub remaining: Quantity,
    pub last_price: Price,
    /// Replacement orders accepted by the exchange.
    pub reprices: u32,
    /// Order left resting because the shutdown cancel did not go through.
    pub active_order: Option<ActiveOrder>,
}

// ============================================================================
// Placement
// ============================================================================

/// Classified result of one placement request.
enum Placement {
    Accepted(OrderAck),
    Rejected { error: ApiError, rate_limited: bool },
    Failed(ExchangeError),
}

impl Placement {
    fn from_result(result: ExchangeResult<ApiResponse<OrderAck>>) -> Self {
        match result {
            Err(e) => Self::Failed(e),
            Ok(response) => {
                let rate_limited = response.is_rate_limited();
                match response.outcome {
                    Outcome::Ok(ack) => Self::Accepted(ack),
                    Outcome::Rejected(error) => Self::Rejected {
                        error,
                        rate_limited,
                    },
                }
            }
        }
    }

    fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

// ============================================================================
// ChaseController
// ============================================================================

/// Sell-order chaser for a single symbol.
pub struct ChaseController<E> {
    exchange: E,
    config: ChaseConfig,
    order_spec: OrderSpec,
    state: TradingState,
    shutdown: CancellationToken,
    /// Consecutive non-rate-limit rejections of replacement orders.
    replacement_rejections: u32,
}

impl<E: ExchangeApi> ChaseController<E> {
    pub fn new(config: ChaseConfig, exchange: E) -> Self {
        Self::with_shutdown(config, exchange, CancellationToken::new())
    }

    /// Create a controller that stops when `shutdown` is cancelled.
    pub fn with_shutdown(config: ChaseConfig, exchange: E, shutdown: CancellationToken) -> Self {
        let state = TradingState::new(config.starting_price, config.sell_quantity);
        let order_spec = OrderSpec::limit_sell(config.symbol.clone());
        Self {
            exchange,
            config,
            order_spec,
            state,
            shutdown,
            replacement_rejections: 0,
        }
    }

    /// Token that requests shutdown when cancelled.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Ask the loop to stop at its next poll boundary.
    pub fn request_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Shutdown requested");
        }
        self.shutdown.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn state(&self) -> &TradingState {
        &self.state
    }

    pub fn config(&self) -> &ChaseConfig {
        &self.config
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    /// Chase decision for `best_bid` against the current order price.
    pub fn evaluate_chase(&self, best_bid: Price) -> ChaseDecision {
        pricing::evaluate_chase(
            best_bid,
            self.state.current_price(),
            self.config.min_sell_price,
            self.config.price_delta,
        )
    }

    /// Run the chase to completion or shutdown.
    ///
    /// Errors are fatal: no exchange call is made after one is returned.
    pub async fn run(&mut self) -> ControllerResult<RunSummary> {
        info!(
            symbol = %self.config.symbol,
            quantity = %self.config.sell_quantity,
            starting_price = %self.config.starting_price,
            min_sell_price = %self.config.min_sell_price,
            price_delta = %self.config.price_delta,
            limit_depth = %self.config.limit_depth,
            "Starting chase"
        );

        let result = self.run_loop().await;
        match &result {
            Ok(summary) => info!(
                outcome = ?summary.outcome,
                remaining = %summary.remaining,
                last_price = %summary.last_price,
                reprices = summary.reprices,
                resting_order = ?summary.active_order.as_ref().map(|o| o.order_id),
                "Chase finished"
            ),
            Err(e) => {
                self.transition(ControllerPhase::Aborted);
                error!(error = %e, "Chase aborted");
            }
        }
        result
    }

    async fn run_loop(&mut self) -> ControllerResult<RunSummary> {
        let min_quantity = self.config.tuning.min_quantity;

        if self.shutdown.is_cancelled() {
            return Ok(self.finish(RunOutcome::ShutDown));
        }
        if self.state.is_exhausted(min_quantity) {
            return Ok(self.finish(RunOutcome::Completed));
        }
        if !self.place_initial_order().await? {
            return Ok(self.finish(RunOutcome::ShutDown));
        }

        loop {
            if self.shutdown.is_cancelled() {
                self.cancel_on_shutdown().await;
                return Ok(self.finish(RunOutcome::ShutDown));
            }
            if self.state.is_exhausted(min_quantity) {
                return Ok(self.finish(RunOutcome::Completed));
            }

            if self.state.active_order().is_none() {
                // Previous replacement was rejected or deferred.
                self.place_replacement().await?;
            } else if let Some(best_bid) = self.poll_best_bid().await {
                match self.evaluate_chase(best_bid) {
                    ChaseDecision::Reprice => self.reprice_cycle().await?,
                    ChaseDecision::AtFloor => debug!(
                        %best_bid,
                        price = %self.state.current_price(),
                        "Chase triggered at floor price; holding"
                    ),
                    ChaseDecision::Hold => trace!(%best_bid, "Holding"),
                }
            }

            self.pause().await;
        }
    }

    /// Place the starting order. Returns `false` if shutdown interrupted
    /// the retries before the exchange accepted it.
    async fn place_initial_order(&mut self) -> ControllerResult<bool> {
        self.transition(ControllerPhase::PlacingInitial);
        let request = self
            .order_spec
            .request(self.state.current_price(), self.state.remaining())?;

        info!(
            client_order_id = %request.client_order_id,
            price = %request.price,
            quantity = request.quantity,
            "Placing initial order"
        );

        let exchange = &self.exchange;
        let order = &request;
        let outcome = attempt(
            move || async move {
                let placement = Placement::from_result(exchange.place_order(order).await);
                if let Placement::Rejected { error, .. } = &placement {
                    Metrics::order_placed(KIND_INITIAL, "rejected");
                    debug!(%error, "Initial order rejected, retrying");
                }
                placement
            },
            Placement::is_rejected,
            RetryPolicy::unbounded(self.config.tuning.initial_retry_delay()),
            &self.shutdown,
        )
        .await;

        let attempts = outcome.attempts();
        let Some(placement) = outcome.into_value() else {
            info!(attempts, "Shutdown before the initial order was accepted");
            return Ok(false);
        };

        match placement {
            Placement::Accepted(ack) => {
                info!(order_id = %ack.order_id, attempts, "Initial order accepted");
                self.accept(ack, request, KIND_INITIAL);
                self.transition(ControllerPhase::Chasing);
                Ok(true)
            }
            Placement::Rejected { error, .. } => Err(ControllerError::PlacementRejected {
                error,
                attempts,
                context: self.context(Some(&request.client_order_id)),
            }),
            Placement::Failed(source) => {
                Metrics::order_placed(KIND_INITIAL, "failed");
                Err(ControllerError::PlacementFailed {
                    source,
                    context: self.context(Some(&request.client_order_id)),
                })
            }
        }
    }

    /// Cancel the resting order and replace it lower.
    async fn reprice_cycle(&mut self) -> ControllerResult<()> {
        let Some(active) = self.state.active_order().cloned() else {
            return Ok(());
        };

        self.transition(ControllerPhase::Cancelling);
        info!(
            order_id = %active.order_id,
            price = %active.price,
            "Chase triggered; cancelling order"
        );

        let response = match self
            .exchange
            .cancel_order(&self.config.symbol, active.order_id)
            .await
        {
            Ok(response) => response,
            Err(source) => {
                Metrics::order_cancelled("failed");
                return Err(ControllerError::CancelFailed {
                    source,
                    context: self.context(None),
                });
            }
        };

        if response.is_rate_limited() {
            // Refused before processing: the order is still resting.
            Metrics::order_cancelled("rate_limited");
            warn!(order_id = %active.order_id, "Cancel rate limited; order left resting");
            self.transition(ControllerPhase::Chasing);
            return Ok(());
        }

        match response.outcome {
            Outcome::Rejected(error) => {
                Metrics::order_cancelled("rejected");
                Err(ControllerError::CancelRejected {
                    error,
                    context: self.context(None),
                })
            }
            Outcome::Ok(ack) => {
                let filled = self.state.record_cancel(ack.executed_qty);
                Metrics::order_cancelled("accepted");
                self.publish_state(self.state.current_price());
                info!(
                    order_id = %active.order_id,
                    %filled,
                    remaining = %self.state.remaining(),
                    "Order cancelled"
                );
                self.place_replacement().await
            }
        }
    }

    /// Price off a fresh bid and place the next order.
    ///
    /// A rejection leaves no active order so the loop retries; a transport
    /// failure is fatal.
    async fn place_replacement(&mut self) -> ControllerResult<()> {
        if self.state.is_exhausted(self.config.tuning.min_quantity) {
            debug!(remaining = %self.state.remaining(), "Nothing left to place");
            return Ok(());
        }

        if self.is_shutting_down() {
            debug!("Shutdown requested; replacement skipped");
            return Ok(());
        }

        self.transition(ControllerPhase::Repricing);
        let Some(fresh_bid) = self.poll_best_bid().await else {
            debug!("No fresh bid; replacement deferred");
            return Ok(());
        };

        let target = pricing::replacement_price(
            fresh_bid,
            self.state.current_price(),
            self.config.min_sell_price,
            self.config.limit_depth,
        );
        if self.is_shutting_down() {
            debug!(%fresh_bid, "Shutdown requested during book read; replacement skipped");
            return Ok(());
        }
        let price = self.state.lower_price(target);

        self.transition(ControllerPhase::Placing);
        let request = self.order_spec.request(price, self.state.remaining())?;
        info!(
            %fresh_bid,
            %price,
            quantity = request.quantity,
            client_order_id = %request.client_order_id,
            "Placing replacement order"
        );

        match Placement::from_result(self.exchange.place_order(&request).await) {
            Placement::Accepted(ack) => {
                info!(order_id = %ack.order_id, %price, "Replacement order accepted");
                self.accept(ack, request, KIND_REPLACEMENT);
                self.state.record_reprice();
                self.replacement_rejections = 0;
                Metrics::reprice_completed();
                self.transition(ControllerPhase::Chasing);
                Ok(())
            }
            Placement::Rejected {
                error,
                rate_limited: true,
            } => {
                Metrics::order_placed(KIND_REPLACEMENT, "rate_limited");
                warn!(%error, "Replacement rate limited; retrying after backoff");
                Ok(())
            }
            Placement::Rejected { error, .. } => {
                Metrics::order_placed(KIND_REPLACEMENT, "rejected");
                self.replacement_rejections += 1;
                if self.replacement_rejections >= self.config.tuning.max_replacement_rejections {
                    return Err(ControllerError::PlacementRejected {
                        error,
                        attempts: self.replacement_rejections,
                        context: self.context(Some(&request.client_order_id)),
                    });
                }
                warn!(
                    %error,
                    consecutive = self.replacement_rejections,
                    "Replacement rejected; retrying"
                );
                self.sleep_or_shutdown(self.config.tuning.initial_retry_delay())
                    .await;
                Ok(())
            }
            Placement::Failed(source) => {
                Metrics::order_placed(KIND_REPLACEMENT, "failed");
                Err(ControllerError::PlacementFailed {
                    source,
                    context: self.context(Some(&request.client_order_id)),
                })
            }
        }
    }

    /// Read the best bid, retrying transport failures.
    ///
    /// `None` when no usable bid was obtained; the caller skips its step.
    async fn poll_best_bid(&self) -> Option<Price> {
        let exchange = &self.exchange;
        let symbol = self.config.symbol.as_str();
        let tuning = &self.config.tuning;

        let outcome = attempt(
            move || exchange.get_order_book(symbol),
            |result| result.is_err(),
            RetryPolicy::bounded(tuning.book_retry_attempts, tuning.book_retry_delay()),
            &self.shutdown,
        )
        .await;

        let attempts = outcome.attempts();
        match outcome.into_value()? {
            Ok(response) => {
                let status = response.status;
                match response.outcome {
                    Outcome::Ok(ticker) => {
                        let snapshot = ticker.snapshot();
                        if !snapshot.has_bid() {
                            warn!(symbol, "Order book has no bids");
                            return None;
                        }
                        Metrics::best_bid(gauge(snapshot.best_bid.inner()));
                        Some(snapshot.best_bid)
                    }
                    Outcome::Rejected(error) => {
                        warn!(status, %error, "Order book request rejected");
                        None
                    }
                }
            }
            Err(e) => {
                Metrics::book_read_failed();
                warn!(error = %e, attempts, "Order book unavailable");
                None
            }
        }
    }

    /// One best-effort cancel of the resting order. Failures are logged.
    async fn cancel_on_shutdown(&mut self) {
        let Some(active) = self.state.active_order().cloned() else {
            info!("Shutdown with no resting order");
            return;
        };

        self.transition(ControllerPhase::Cancelling);
        info!(order_id = %active.order_id, "Shutdown: cancelling resting order");

        match self
            .exchange
            .cancel_order(&self.config.symbol, active.order_id)
            .await
        {
            Ok(response) => {
                let rate_limited = response.is_rate_limited();
                match response.outcome {
                    Outcome::Ok(ack) => {
                        let filled = self.state.record_cancel(ack.executed_qty);
                        Metrics::order_cancelled("accepted");
                        info!(
                            order_id = %active.order_id,
                            %filled,
                            remaining = %self.state.remaining(),
                            "Resting order cancelled"
                        );
                    }
                    Outcome::Rejected(error) => {
                        Metrics::order_cancelled("rejected");
                        error!(
                            order_id = %active.order_id,
                            %error,
                            rate_limited,
                            "Shutdown cancel rejected; order may still be resting"
                        );
                    }
                }
            }
            Err(e) => {
                Metrics::order_cancelled("failed");
                error!(
                    order_id = %active.order_id,
                    client_order_id = %active.client_order_id,
                    error = %e,
                    "Shutdown cancel failed; order may still be resting"
                );
            }
        }
    }

    fn accept(&mut self, ack: OrderAck, request: OrderRequest, kind: &str) {
        if let Some(filled) = ack.executed_qty.filter(|q| !q.is_zero()) {
            info!(order_id = %ack.order_id, %filled, "Order partially filled on placement");
        }
        Metrics::order_placed(kind, "accepted");
        self.publish_state(request.price);
        self.state.record_placement(ActiveOrder {
            order_id: ack.order_id,
            client_order_id: request.client_order_id,
            price: request.price,
            quantity: request.quantity,
        });
    }

    fn publish_state(&self, price: Price) {
        Metrics::order_state(gauge(price.inner()), gauge(self.state.remaining().inner()));
    }

    async fn pause(&self) {
        let interval = self.config.tuning.poll_interval();
        if interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            self.sleep_or_shutdown(interval).await;
        }
    }

    async fn sleep_or_shutdown(&self, duration: Duration) {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }

    fn transition(&mut self, next: ControllerPhase) {
        let previous = self.state.set_phase(next);
        if previous != next {
            debug!(from = %previous, to = %next, "Phase transition");
        }
    }

    fn finish(&mut self, outcome: RunOutcome) -> RunSummary {
        self.transition(match outcome {
            RunOutcome::Completed => ControllerPhase::Done,
            RunOutcome::ShutDown => ControllerPhase::Aborted,
        });
        RunSummary {
            outcome,
            remaining: self.state.remaining(),
            last_price: self.state.current_price(),
            reprices: self.state.reprices(),
            active_order: self.state.active_order().cloned(),
        }
    }

    fn context(&self, client_order_id: Option<&ClientOrderId>) -> ReconcileContext {
        let active = self.state.active_order();
        ReconcileContext {
            symbol: self.config.symbol.clone(),
            order_id: active.map(|o| o.order_id),
            client_order_id: client_order_id
                .or(active.map(|o| &o.client_order_id))
                .cloned(),
            remaining: self.state.remaining(),
            price: self.state.current_price(),
        }
    }
}

fn gauge(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
