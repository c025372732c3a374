//! tradedesk Dashboard
//!
//! Terminal control panel. Reads the job board with the restricted store
//! credential, redraws on every change notification, and sends orders,
//! retries and history clears to the API server.

use dotenvy::dotenv;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::signal;
use tracing::{error, info};
use tradedesk::config::DashboardConfig;
use tradedesk::dashboard::command::{is_confirmation, HELP};
use tradedesk::dashboard::{render_board, render_form, Command, ControlClient, DashboardSession};
use tradedesk::db::PgJobReader;
use tradedesk::logging;

type Input = Lines<BufReader<Stdin>>;

async fn prompt(input: &mut Input, message: &str) -> std::io::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(message.as_bytes()).await?;
    stdout.flush().await?;
    input.next_line().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // stdout belongs to the table
    logging::init_logging_with_default("warn");

    let config = DashboardConfig::from_env()?;
    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();

    let code = match prompt(&mut input, "Access code: ").await? {
        Some(code) => code,
        None => return Ok(()),
    };
    let client = ControlClient::new(config.api_url.clone(), code.trim());
    if let Err(e) = client.verify_access().await {
        if e.is_unauthorized() {
            println!("Access denied");
            return Ok(());
        }
        return Err(e.into());
    }

    let reader = Arc::new(PgJobReader::connect(&config.store).await?);
    let mut session = DashboardSession::new(reader, Arc::new(client));
    let reconciler = session.activate();
    info!(api = %config.api_url, "Dashboard connected");

    let mut board = session.subscribe();
    let painter = tokio::spawn(async move {
        while board.changed().await.is_ok() {
            let snapshot = board.borrow_and_update().clone();
            println!("\n{}", render_board(snapshot.jobs()));
        }
    });

    println!("{}", HELP);
    println!("{}", render_form(&session.form));

    loop {
        let line = tokio::select! {
            _ = signal::ctrl_c() => break,
            line = input.next_line() => line?,
        };
        let Some(line) = line else { break };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        let echo_form = !matches!(command, Command::Show | Command::Help);
        match command {
            Command::Action(action) => session.form.action = action,
            Command::Tickers(tickers) => session.form.tickers = tickers,
            Command::Quantity(quantity) => session.form.quantity = quantity,
            Command::Toggle(brokerage) => session.form.selection.toggle(brokerage),
            Command::ToggleAll => session.form.selection.toggle_all(),
            Command::Submit => match session.submit().await {
                Ok(receipt) => println!("Queued {} jobs", receipt.count),
                Err(e) => println!("Submit failed: {}", e),
            },
            Command::Retry(id) => match session.retry(&id).await {
                Ok(_) => println!("Retry queued"),
                Err(e) => println!("Retry failed: {}", e),
            },
            Command::Clear => {
                let answer = prompt(&mut input, "Clear all history? [y/N] ").await?;
                let confirmed = answer.as_deref().map(is_confirmation).unwrap_or(false);
                match session.clear_history(confirmed).await {
                    Ok(true) => println!("History cleared"),
                    Ok(false) => println!("Cancelled"),
                    Err(e) => println!("Clear failed: {}", e),
                }
            }
            Command::Show => println!("{}", render_board(session.board().jobs())),
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }

        if echo_form {
            println!("{}", render_form(&session.form));
        }
    }

    reconciler.abort();
    painter.abort();
    if let Err(e) = reconciler.await {
        if !e.is_cancelled() {
            error!(error = %e, "Reconciler task failed");
        }
    }
    Ok(())
}
