//! Operator dashboard: live job board plus submit, retry and clear actions

pub mod board;
pub mod client;
pub mod command;
pub mod form;
pub mod render;
pub mod selection;
pub mod session;

pub use board::JobBoard;
pub use client::{ClientError, ControlClient};
pub use command::Command;
pub use form::OrderForm;
pub use render::{render_board, render_form};
pub use selection::BrokerageSelection;
pub use session::{DashboardSession, Reconciler, SessionError};
