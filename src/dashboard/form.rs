//! Order entry form state

use crate::dashboard::BrokerageSelection;
use crate::fanout::TradeRequest;
use crate::models::TradeAction;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderForm {
    pub tickers: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub selection: BrokerageSelection,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            tickers: String::new(),
            action: TradeAction::Buy,
            quantity: 1,
            selection: BrokerageSelection::default(),
        }
    }
}

impl OrderForm {
    pub fn can_submit(&self) -> bool {
        !self.tickers.trim().is_empty()
    }

    pub fn to_request(&self) -> TradeRequest {
        TradeRequest {
            tickers: self.tickers.clone(),
            action: self.action,
            quantity: self.quantity.into(),
            brokerages: self.selection.selected(),
        }
    }

    pub fn clear_tickers(&mut self) {
        self.tickers.clear();
    }
}
