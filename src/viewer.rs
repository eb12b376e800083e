use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::api::InventoryApi;
use crate::charts::{waste_charts, WasteCharts};
use crate::csv_export;
use crate::error::{MandiError, Result};
use crate::models::{InventoryKind, InventoryPage, InventoryRecord, Tab};
use crate::reports::{self, StoreTotal, TableModel};

pub const FAILURE_MESSAGE: &str = "Failed to load inventory data. Please try again later.";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading,
    Loaded,
    /// The server answered with no records for the requested page.
    Empty,
    Failed { reason: String },
}

/// Identifies one issued fetch. Only the ticket from the latest fetch is
/// accepted back by [`Viewer::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub page: u32,
}

pub type FetchOutcome = (FetchTicket, Result<InventoryPage>);

pub struct Viewer {
    kind: InventoryKind,
    tab: Tab,
    today: String,
    records: Vec<InventoryRecord>,
    requested_page: u32,
    current_page: u32,
    total_pages: u32,
    state: ViewState,
    generation: u64,
}

impl Viewer {
    pub fn new(kind: InventoryKind, today: impl Into<String>) -> Self {
        Self {
            kind,
            tab: Tab::Today,
            today: today.into(),
            records: Vec::new(),
            requested_page: 1,
            current_page: 1,
            total_pages: 1,
            state: ViewState::Idle,
            generation: 0,
        }
    }

    pub fn with_tab(mut self, tab: Tab) -> Self {
        self.tab = tab;
        self
    }

    pub fn kind(&self) -> InventoryKind {
        self.kind
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn today(&self) -> &str {
        &self.today
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.state == ViewState::Loading
    }

    /// Retry is offered for failures only, never for an empty result.
    pub fn can_retry(&self) -> bool {
        matches!(self.state, ViewState::Failed { .. })
    }

    fn can_paginate(&self) -> bool {
        matches!(self.state, ViewState::Loaded | ViewState::Empty)
    }

    pub fn has_next(&self) -> bool {
        self.can_paginate() && self.current_page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.can_paginate() && self.current_page > 1
    }

    /// Start a fetch for `page` (clamped to at least 1). Any fetch still in
    /// flight is superseded: its response will be discarded.
    pub fn begin_fetch(&mut self, page: u32) -> FetchTicket {
        self.generation += 1;
        self.requested_page = page.max(1);
        self.state = ViewState::Loading;
        FetchTicket {
            generation: self.generation,
            page: self.requested_page,
        }
    }

    /// Apply a fetch result. Returns `false` when the ticket is stale and the
    /// result was dropped.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<InventoryPage>) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "discarding stale response for page {} (generation {} < {})",
                ticket.page,
                ticket.generation,
                self.generation
            );
            return false;
        }

        match result {
            Ok(page) if page.is_empty() => {
                self.records.clear();
                self.current_page = ticket.page;
                self.total_pages = 1;
                self.state = ViewState::Empty;
            }
            Ok(page) => {
                self.records = page.records;
                self.current_page = page.current_page;
                self.total_pages = page.total_pages.max(1);
                self.state = ViewState::Loaded;
            }
            Err(e) => {
                if e.is_fetch_failure() {
                    log::warn!("error fetching {} inventory page {}: {e}", self.kind.slug(), ticket.page);
                } else {
                    log::error!("{} inventory page {}: {e}", self.kind.slug(), ticket.page);
                }
                self.records.clear();
                self.state = ViewState::Failed {
                    reason: e.to_string(),
                };
            }
        }
        true
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        if !self.has_next() {
            return None;
        }
        Some(self.begin_fetch(self.current_page + 1))
    }

    pub fn prev_page(&mut self) -> Option<FetchTicket> {
        if !self.has_prev() {
            return None;
        }
        Some(self.begin_fetch(self.current_page - 1))
    }

    /// Re-issue the failed fetch for the same page.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if !self.can_retry() {
            return None;
        }
        Some(self.begin_fetch(self.requested_page))
    }

    pub fn toggle_tab(&mut self) {
        self.tab = self.tab.toggled();
    }

    /// Records in the active tab.
    pub fn visible(&self) -> Vec<&InventoryRecord> {
        reports::partition(&self.records, &self.today)
            .tab(self.tab)
            .to_vec()
    }

    pub fn table(&self) -> Option<TableModel> {
        reports::render_table(self.kind, &self.visible())
    }

    /// Message shown in place of the table when there is nothing to show.
    pub fn empty_message(&self) -> String {
        match self.state {
            ViewState::Empty => format!(
                "No {} inventory items found for this period.",
                self.kind.slug()
            ),
            _ => reports::EMPTY_MESSAGE.to_string(),
        }
    }

    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.current_page, self.total_pages)
    }

    /// Store totals over the whole loaded page. Waste only.
    pub fn store_totals(&self) -> Option<Vec<StoreTotal>> {
        (self.kind == InventoryKind::Waste).then(|| reports::aggregate_by_store(&self.records))
    }

    pub fn charts(&self) -> Option<WasteCharts> {
        (self.kind == InventoryKind::Waste).then(|| waste_charts(&self.records))
    }

    /// Export the active tab's records.
    pub fn export_csv(&self, export_dir: &Path, output: Option<&Path>) -> Result<PathBuf> {
        csv_export::export_to_file(self.kind, self.tab, &self.visible(), export_dir, output)
    }

    /// Fetch `page` on the calling thread.
    pub fn load(&mut self, api: &dyn InventoryApi, page: u32, limit: u32) -> &ViewState {
        let ticket = self.begin_fetch(page);
        let result = api.fetch_page(self.kind, ticket.page, limit);
        self.complete(ticket, result);
        &self.state
    }

    /// The error behind a failed state, for non-interactive callers.
    pub fn failure(&self) -> Option<MandiError> {
        match &self.state {
            ViewState::Failed { reason } => Some(MandiError::Other(format!("{FAILURE_MESSAGE} ({reason})"))),
            _ => None,
        }
    }
}

/// Run one fetch on a worker thread and post the outcome to `tx`.
pub fn spawn_fetch(
    api: Arc<dyn InventoryApi>,
    kind: InventoryKind,
    limit: u32,
    ticket: FetchTicket,
    tx: Sender<FetchOutcome>,
) {
    std::thread::spawn(move || {
        let result = api.fetch_page(kind, ticket.page, limit);
        // The receiver is gone once the viewer has closed.
        let _ = tx.send((ticket, result));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves canned pages and remembers which pages were requested.
    struct FakeApi {
        total_pages: u32,
        fail_with: Option<u16>,
        requested: Mutex<Vec<u32>>,
    }

    impl FakeApi {
        fn pages(total_pages: u32) -> Self {
            Self {
                total_pages,
                fail_with: None,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                total_pages: 1,
                fail_with: Some(status),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl InventoryApi for FakeApi {
        fn fetch_page(&self, _kind: InventoryKind, page: u32, _limit: u32) -> Result<InventoryPage> {
            self.requested.lock().unwrap().push(page);
            if let Some(status) = self.fail_with {
                return Err(MandiError::Status(status));
            }
            Ok(InventoryPage {
                records: vec![record(json!({"page": page, "currentDate": "2025-01-02"}))],
                current_page: page,
                total_pages: self.total_pages,
            })
        }
    }

    fn page_of(n: u32, total: u32) -> InventoryPage {
        InventoryPage {
            records: vec![record(json!({"page": n}))],
            current_page: n,
            total_pages: total,
        }
    }

    #[test]
    fn test_starts_idle() {
        let v = Viewer::new(InventoryKind::Product, "2025-01-02");
        assert_eq!(v.state(), &ViewState::Idle);
        assert_eq!(v.current_page(), 1);
    }

    #[test]
    fn test_pagination_walks_forward_and_stops_at_bounds() {
        let api = FakeApi::pages(3);
        let mut v = Viewer::new(InventoryKind::Product, "2025-01-02");
        v.load(&api, 1, 10);
        assert!(v.prev_page().is_none());

        for _ in 0..2 {
            let ticket = v.next_page().unwrap();
            let result = api.fetch_page(v.kind(), ticket.page, 10);
            v.complete(ticket, result);
        }
        assert_eq!(v.current_page(), 3);
        assert!(v.next_page().is_none());
        assert_eq!(api.requested(), vec![1, 2, 3]);
    }

    #[test]
    fn test_prev_at_first_page_is_noop() {
        let api = FakeApi::pages(2);
        let mut v = Viewer::new(InventoryKind::Waste, "2025-01-02");
        v.load(&api, 1, 10);
        assert!(v.prev_page().is_none());
        assert_eq!(v.state(), &ViewState::Loaded);
        assert_eq!(api.requested(), vec![1]);
    }

    #[test]
    fn test_pagination_disabled_while_loading() {
        let mut v = Viewer::new(InventoryKind::Product, "2025-01-02");
        let t = v.begin_fetch(1);
        v.complete(t, Ok(page_of(1, 3)));
        let _in_flight = v.next_page().unwrap();
        assert!(v.is_loading());
        assert!(v.next_page().is_none());
        assert!(v.prev_page().is_none());
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let mut v = Viewer::new(InventoryKind::Waste, "2025-01-02");
        let t = v.begin_fetch(1);
        let empty = InventoryPage {
            records: vec![],
            current_page: 1,
            total_pages: 1,
        };
        v.complete(t, Ok(empty));
        assert_eq!(v.state(), &ViewState::Empty);
        assert!(!v.can_retry());
        assert!(v.retry().is_none());
        assert!(v.table().is_none());
        assert_eq!(v.empty_message(), "No waste inventory items found for this period.");
    }

    #[test]
    fn test_empty_result_forces_single_page() {
        let mut v = Viewer::new(InventoryKind::Waste, "2025-01-02");
        let t = v.begin_fetch(1);
        v.complete(t, Ok(page_of(1, 5)));
        assert_eq!(v.total_pages(), 5);
        let t = v.next_page().unwrap();
        v.complete(
            t,
            Ok(InventoryPage {
                records: vec![],
                current_page: 2,
                total_pages: 5,
            }),
        );
        assert_eq!(v.total_pages(), 1);
        assert!(!v.has_next());
        assert!(v.has_prev());
    }

    #[test]
    fn test_server_error_offers_retry_for_same_page() {
        let api = FakeApi::failing(500);
        let mut v = Viewer::new(InventoryKind::Product, "2025-01-02");
        v.load(&api, 2, 10);
        assert!(matches!(v.state(), ViewState::Failed { reason } if reason.contains("500")));
        assert!(v.can_retry());
        assert!(v.records().is_empty());
        assert!(v.next_page().is_none());

        let ticket = v.retry().unwrap();
        assert_eq!(ticket.page, 2);
        assert!(v.is_loading());
        let result = api.fetch_page(v.kind(), ticket.page, 10);
        v.complete(ticket, result);
        assert_eq!(api.requested(), vec![2, 2]);
        assert!(v.failure().unwrap().to_string().starts_with(FAILURE_MESSAGE));
    }

    #[test]
    fn test_failure_clears_previous_records() {
        let mut v = Viewer::new(InventoryKind::Product, "2025-01-02");
        let t = v.begin_fetch(1);
        v.complete(t, Ok(page_of(1, 2)));
        assert_eq!(v.records().len(), 1);
        let t = v.next_page().unwrap();
        v.complete(t, Err(MandiError::NotJson("text/html".into())));
        assert!(v.records().is_empty());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut v = Viewer::new(InventoryKind::Product, "2025-01-02");
        let first = v.begin_fetch(1);
        v.complete(first, Ok(page_of(1, 3)));

        let to_page_two = v.next_page().unwrap();
        // Superseded before it resolves.
        let to_page_one = v.begin_fetch(1);
        assert!(v.complete(to_page_one, Ok(page_of(1, 3))));
        assert!(!v.complete(to_page_two, Ok(page_of(2, 3))));
        assert_eq!(v.current_page(), 1);
        assert_eq!(v.records()[0].get("page"), Some(&json!(1)));
    }

    #[test]
    fn test_tab_switch_does_not_refetch() {
        let api = FakeApi::pages(1);
        let mut v = Viewer::new(InventoryKind::Product, "2025-01-02");
        v.load(&api, 1, 10);
        assert_eq!(v.visible().len(), 1);
        v.toggle_tab();
        assert_eq!(v.tab(), Tab::History);
        assert!(v.visible().is_empty());
        assert_eq!(v.state(), &ViewState::Loaded);
        assert_eq!(api.requested(), vec![1]);
    }

    #[test]
    fn test_aggregates_only_for_waste() {
        let api = FakeApi::pages(1);
        let mut product = Viewer::new(InventoryKind::Product, "2025-01-02");
        product.load(&api, 1, 10);
        assert!(product.store_totals().is_none());
        assert!(product.charts().is_none());

        let mut waste = Viewer::new(InventoryKind::Waste, "2025-01-02");
        waste.load(&api, 1, 10);
        assert_eq!(waste.store_totals().unwrap().len(), 4);
    }

    #[test]
    fn test_worker_posts_outcome() {
        let api: Arc<dyn InventoryApi> = Arc::new(FakeApi::pages(2));
        let mut v = Viewer::new(InventoryKind::Waste, "2025-01-02");
        let (tx, rx) = std::sync::mpsc::channel();
        let ticket = v.begin_fetch(1);
        spawn_fetch(api, v.kind(), 10, ticket, tx);
        let (t, result) = rx.recv().unwrap();
        assert!(v.complete(t, result));
        assert_eq!(v.state(), &ViewState::Loaded);
        assert!(v.has_next());
    }
}
