use tradedesk::dashboard::{BrokerageSelection, OrderForm};
use tradedesk::fanout::QuantityInput;
use tradedesk::models::{Brokerage, TradeAction};

#[test]
fn everything_is_selected_by_default() {
    let selection = BrokerageSelection::default();
    assert!(selection.all_selected());
    assert_eq!(selection.selected(), Brokerage::ALL.to_vec());
}

#[test]
fn toggle_flips_one_brokerage() {
    let mut selection = BrokerageSelection::default();
    selection.toggle(Brokerage::Robinhood);
    assert!(!selection.is_selected(Brokerage::Robinhood));
    assert!(!selection.all_selected());
    assert_eq!(selection.selected().len(), Brokerage::ALL.len() - 1);

    selection.toggle(Brokerage::Robinhood);
    assert!(selection.all_selected());
}

#[test]
fn toggle_all_selects_all_unless_everything_is_selected() {
    let mut selection = BrokerageSelection::default();
    selection.toggle_all();
    assert!(selection.selected().is_empty());

    selection.toggle(Brokerage::Sofi);
    selection.toggle_all();
    assert!(selection.all_selected());
}

#[test]
fn selected_is_in_display_order() {
    let mut selection = BrokerageSelection::none();
    selection.toggle(Brokerage::Sofi);
    selection.toggle(Brokerage::Fidelity);
    selection.toggle(Brokerage::TRowe);
    assert_eq!(
        selection.selected(),
        vec![Brokerage::Fidelity, Brokerage::TRowe, Brokerage::Sofi]
    );
}

#[test]
fn form_defaults_to_buy_one_everywhere() {
    let form = OrderForm::default();
    assert_eq!(form.action, TradeAction::Buy);
    assert_eq!(form.quantity, 1);
    assert!(form.selection.all_selected());
    assert!(!form.can_submit());
}

#[test]
fn form_builds_request_from_its_fields() {
    let mut form = OrderForm {
        tickers: "aapl tsla".into(),
        action: TradeAction::Sell,
        quantity: 7,
        selection: BrokerageSelection::none(),
    };
    form.selection.toggle(Brokerage::Schwab);

    let request = form.to_request();
    assert_eq!(request.tickers, "aapl tsla");
    assert_eq!(request.action, TradeAction::Sell);
    assert_eq!(request.quantity, QuantityInput::from(7u32));
    assert_eq!(request.brokerages, vec![Brokerage::Schwab]);

    form.clear_tickers();
    assert!(!form.can_submit());
    assert_eq!(form.quantity, 7);
}

#[test]
fn blank_tickers_cannot_be_submitted() {
    let form = OrderForm {
        tickers: " \t ".into(),
        ..OrderForm::default()
    };
    assert!(!form.can_submit());
}
