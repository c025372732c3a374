//! Job fan-out: one submission becomes one job per (ticker, brokerage)

pub mod expand;
pub mod request;
pub mod service;

pub use expand::{expand, parse_tickers};
pub use request::{FanOutReceipt, QuantityInput, TradeRequest};
pub use service::FanOutService;

use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum FanOutError {
    #[error("quantity must be a positive whole number, got '{0}'")]
    InvalidQuantity(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
