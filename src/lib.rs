//! tradedesk: fan trade orders out across brokerage accounts and watch them run.

pub mod auth;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod fanout;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
