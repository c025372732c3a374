//! Plain-text rendering of the board and the order form

use crate::dashboard::OrderForm;
use crate::models::{Brokerage, Job};
use chrono::Local;

const HEADERS: [&str; 6] = ["Time", "Brokerage", "Action", "Status", "Details", "Retry"];
const DETAILS_WIDTH: usize = 40;
const SHORT_ID_LEN: usize = 8;

pub fn short_id(job: &Job) -> String {
    job.id.to_string().chars().take(SHORT_ID_LEN).collect()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn row(job: &Job) -> [String; 6] {
    [
        job.created_at.with_timezone(&Local).format("%H:%M:%S").to_string(),
        job.brokerage.to_string(),
        format!("{} {} {}", job.action, job.quantity, job.ticker),
        job.status.to_string(),
        truncate(job.log.as_deref().unwrap_or("-"), DETAILS_WIDTH),
        if job.status.is_retryable() {
            format!("retry {}", short_id(job))
        } else {
            String::new()
        },
    ]
}

/// The execution log table, newest first as given.
pub fn render_board(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return "No active trades\n".to_string();
    }

    let rows: Vec<[String; 6]> = jobs.iter().map(row).collect();
    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: &[String]| {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };

    push_line(&HEADERS.map(String::from));
    push_line(&widths.map(|w| "-".repeat(w)));
    for cells in &rows {
        push_line(cells);
    }
    out
}

/// One-line summary of what `submit` would send.
pub fn render_form(form: &OrderForm) -> String {
    let brokerages: Vec<String> = Brokerage::ALL
        .iter()
        .map(|b| {
            if form.selection.is_selected(*b) {
                format!("[x] {}", b)
            } else {
                format!("[ ] {}", b)
            }
        })
        .collect();
    format!(
        "{} {} x '{}' -> {}",
        form.action,
        form.quantity,
        form.tickers.trim(),
        brokerages.join(" ")
    )
}
