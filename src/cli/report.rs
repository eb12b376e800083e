use std::io::IsTerminal;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::Session;
use crate::error::Result;
use crate::fmt::units;
use crate::models::{InventoryKind, Tab};
use crate::reports::{aggregate_by_date_and_store, StoreTotal};
use crate::viewer::{ViewState, Viewer, FAILURE_MESSAGE};

/// `mandi view`: interactive when stdout is a terminal, text otherwise.
pub fn view(session: &Session, kind: InventoryKind, page: u32, tab: Tab) -> Result<()> {
    if std::io::stdout().is_terminal() {
        crate::cli::view::run(session, kind, page, tab)
    } else {
        run(session, kind, page, tab)
    }
}

/// `mandi report`: fetch one page and print it.
pub fn run(session: &Session, kind: InventoryKind, page: u32, tab: Tab) -> Result<()> {
    let viewer = load(session, kind, page, tab);
    println!("{}", format_report(&viewer));
    match viewer.failure() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub(crate) fn load(session: &Session, kind: InventoryKind, page: u32, tab: Tab) -> Viewer {
    let api = session.api();
    let mut viewer = Viewer::new(kind, session.today.clone()).with_tab(tab);
    viewer.load(api.as_ref(), page, session.page_size());
    viewer
}

// ---------------------------------------------------------------------------
// Pure formatting functions (viewer state → String)
// ---------------------------------------------------------------------------

pub fn format_report(viewer: &Viewer) -> String {
    let mut out = format!(
        "{} \u{2014} {}  ({}, today is {})\n",
        viewer.kind().title().bold(),
        viewer.tab().label(),
        viewer.page_label(),
        viewer.today()
    );

    match viewer.state() {
        ViewState::Failed { reason } => {
            out.push_str(&format!("{}\n{}\n", FAILURE_MESSAGE.red().bold(), reason.dimmed()));
            return out;
        }
        ViewState::Idle | ViewState::Loading => {
            out.push_str("Loading inventory data...\n");
            return out;
        }
        ViewState::Loaded | ViewState::Empty => {}
    }

    match viewer.table() {
        Some(table) => {
            let mut t = Table::new();
            t.set_header(table.labels());
            for row in table.filled_rows("-") {
                t.add_row(row);
            }
            out.push_str(&t.to_string());
            out.push('\n');
        }
        None => {
            out.push_str(&viewer.empty_message().italic().to_string());
            out.push('\n');
        }
    }

    if let Some(totals) = viewer.store_totals() {
        if viewer.state() == &ViewState::Loaded {
            out.push('\n');
            out.push_str(&format_store_totals(&totals));
            out.push('\n');
            out.push_str(&format_date_totals(viewer));
        }
    }
    out
}

pub fn format_store_totals(totals: &[StoreTotal]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Store", "Waste (units)"]);
    for t in totals {
        table.add_row(vec![
            Cell::new(&t.store),
            Cell::new(units(t.quantity)).set_alignment(CellAlignment::Right),
        ]);
    }
    let total: i64 = totals.iter().map(|t| t.quantity).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(units(total)).set_alignment(CellAlignment::Right),
    ]);
    format!("{}\n{table}\n", "Waste Quantities by Store".green().bold())
}

fn format_date_totals(viewer: &Viewer) -> String {
    let totals = aggregate_by_date_and_store(viewer.records());
    let mut table = Table::new();
    table.set_header(vec!["Date", "Store", "Waste (units)"]);
    for (date, by_store) in &totals {
        for (store, qty) in by_store {
            table.add_row(vec![
                Cell::new(date),
                Cell::new(store),
                Cell::new(units(*qty)).set_alignment(CellAlignment::Right),
            ]);
        }
    }
    format!("{}\n{table}\n", "Waste Quantities by Date".green().bold())
}
