//! Ticker parsing and the ticker x brokerage expansion

use crate::fanout::{FanOutError, TradeRequest};
use crate::models::NewJob;

/// Splits on any run of whitespace and uppercases each symbol.
pub fn parse_tickers(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_uppercase).collect()
}

/// One pending job per (ticker, brokerage), ticker-major. Duplicates in
/// either list are kept.
pub fn expand(request: &TradeRequest) -> Result<Vec<NewJob>, FanOutError> {
    let quantity = request.quantity.parse()?;
    let tickers = parse_tickers(&request.tickers);

    let mut jobs = Vec::with_capacity(tickers.len() * request.brokerages.len());
    for ticker in &tickers {
        for brokerage in &request.brokerages {
            jobs.push(NewJob::pending(
                ticker.clone(),
                request.action,
                quantity,
                *brokerage,
            ));
        }
    }
    Ok(jobs)
}
