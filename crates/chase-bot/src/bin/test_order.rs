//! Validate credentials and the starting order against the exchange's
//! order-test endpoint without placing anything.
//!
//! Also reads the current best bid so the operator can sanity-check the
//! starting price.

use anyhow::Result;
use chase_bot::AppConfig;
use chase_core::OrderSpec;
use chase_exchange::{BinanceClient, Credentials, ExchangeApi, Outcome, RequestSigner};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Dry-run the starting order against the order-test endpoint")]
struct Args {
    #[arg(short, long, env = "CHASE_CONFIG", default_value = "config/default.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    chase_telemetry::init_logging()?;

    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;

    let credentials = Credentials::new(config.api_key.clone(), config.api_secret.clone())?;
    let signer = RequestSigner::new(credentials, config.recv_window_ms);
    let client = BinanceClient::new(config.base_url.clone(), signer, config.request_timeout())?;

    let book = client.get_order_book(&config.symbol).await?;
    match book.outcome {
        Outcome::Ok(ticker) => tracing::info!(
            symbol = %ticker.symbol,
            bid = %ticker.bid_price,
            ask = %ticker.ask_price,
            "Current top of book"
        ),
        Outcome::Rejected(error) => {
            tracing::warn!(status = book.status, %error, "Book ticker request rejected")
        }
    }

    let order = OrderSpec::limit_sell(config.symbol.clone())
        .request(config.starting_price, config.sell_quantity)?;
    tracing::info!(
        price = %order.price.to_wire(),
        quantity = order.quantity,
        "Testing starting order"
    );

    let response = client.test_order(&order).await?;
    match response.outcome {
        Outcome::Ok(_) => tracing::info!("Order accepted by the test endpoint"),
        Outcome::Rejected(error) => {
            tracing::error!(status = response.status, %error, "Order rejected by the test endpoint")
        }
    }

    Ok(())
}
