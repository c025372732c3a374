//! Terminal commands understood by the dashboard

use crate::models::{Brokerage, TradeAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(TradeAction),
    Tickers(String),
    Quantity(u32),
    Toggle(Brokerage),
    ToggleAll,
    Submit,
    Retry(String),
    Clear,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  buy | sell            set the order side
  tickers <A B C>       set the space separated ticker list
  qty <n>               set the quantity
  toggle <Brokerage>    select or deselect one brokerage
  toggle-all            select all brokerages, or none if all are selected
  submit                send the order to every selected brokerage
  retry <id>            resubmit a FAILED job (id prefix from the Retry column)
  clear                 delete all history (asks for confirmation)
  show                  redraw the board
  help | quit";

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "buy" => Ok(Command::Action(TradeAction::Buy)),
            "sell" => Ok(Command::Action(TradeAction::Sell)),
            "tickers" | "t" => Ok(Command::Tickers(rest.to_string())),
            "qty" | "quantity" | "q" => rest
                .parse::<u32>()
                .ok()
                .filter(|q| *q > 0)
                .map(Command::Quantity)
                .ok_or_else(|| format!("quantity must be a positive whole number, got '{}'", rest)),
            "toggle" => Brokerage::ALL
                .iter()
                .copied()
                .find(|b| b.as_str().eq_ignore_ascii_case(rest))
                .map(Command::Toggle)
                .ok_or_else(|| {
                    let names: Vec<&str> = Brokerage::ALL.iter().map(|b| b.as_str()).collect();
                    format!("unknown brokerage '{}', expected one of {}", rest, names.join(", "))
                }),
            "toggle-all" => Ok(Command::ToggleAll),
            "submit" | "go" => Ok(Command::Submit),
            "retry" if !rest.is_empty() => Ok(Command::Retry(rest.to_string())),
            "retry" => Err("retry needs a job id".to_string()),
            "clear" => Ok(Command::Clear),
            "show" | "" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command '{}', type 'help'", other)),
        }
    }
}

/// Whether a confirmation answer means yes.
pub fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
