//! Which brokerages a submission targets

use crate::models::Brokerage;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerageSelection {
    selected: HashSet<Brokerage>,
}

/// Everything is selected until the operator says otherwise.
impl Default for BrokerageSelection {
    fn default() -> Self {
        Self {
            selected: Brokerage::ALL.into_iter().collect(),
        }
    }
}

impl BrokerageSelection {
    pub fn none() -> Self {
        Self {
            selected: HashSet::new(),
        }
    }

    pub fn is_selected(&self, brokerage: Brokerage) -> bool {
        self.selected.contains(&brokerage)
    }

    pub fn all_selected(&self) -> bool {
        self.selected.len() == Brokerage::ALL.len()
    }

    pub fn toggle(&mut self, brokerage: Brokerage) {
        if !self.selected.remove(&brokerage) {
            self.selected.insert(brokerage);
        }
    }

    /// Clears the selection when everything is selected, otherwise selects all.
    pub fn toggle_all(&mut self) {
        if self.all_selected() {
            self.selected.clear();
        } else {
            self.selected = Brokerage::ALL.into_iter().collect();
        }
    }

    /// Selected brokerages in display order.
    pub fn selected(&self) -> Vec<Brokerage> {
        Brokerage::ALL
            .into_iter()
            .filter(|b| self.selected.contains(b))
            .collect()
    }
}
