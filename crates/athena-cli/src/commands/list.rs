//! The `athena list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use athena_core::dashboard::{grade_cell, Dashboard};
use athena_core::lock::LockState;

use super::Context;

const DEFAULT_WIDTH: u16 = 80;

pub async fn execute(config_path: Option<PathBuf>, width: Option<u16>) -> Result<()> {
    let ctx = Context::load(config_path.as_deref())?;
    let mut dashboard = Dashboard::new(ctx.backend, ctx.store, LockState::default());
    dashboard.load().await;

    if dashboard.quiz_sets().is_empty() {
        println!("No quiz sets. Run `athena scrape` to create one.");
        return Ok(());
    }

    let locked = dashboard.lock().is_locked().await;
    let layout = ctx
        .config
        .breakpoints
        .layout(width.unwrap_or_else(terminal_width));

    let mut table = Table::new();
    table.set_header(vec!["", "Id", "Title", "Status", "Progress", "Grade", "Lock"]);
    for set in dashboard.quiz_sets() {
        let checkbox = if dashboard.is_checked(&set.id) { "[x]" } else { "[ ]" };
        table.add_row(vec![
            Cell::new(checkbox),
            Cell::new(&set.id),
            Cell::new(&set.title),
            Cell::new(set.badge(locked)),
            Cell::new(format!("{}%", set.progress)),
            Cell::new(grade_cell(set, layout, locked)),
            Cell::new(if set.lock_state { "locked" } else { "open" }),
        ]);
    }

    println!("{table}");
    if locked {
        println!("Grades are locked. Run `athena lock --global` to reveal them.");
    }
    Ok(())
}

fn terminal_width() -> u16 {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.trim().parse().ok())
        .unwrap_or(DEFAULT_WIDTH)
}
