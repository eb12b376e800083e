use std::collections::BTreeMap;

use serde_json::Value;

use crate::fmt::short_date;
use crate::models::{CellFormat, Column, InventoryKind, InventoryRecord, Tab};

pub const EMPTY_MESSAGE: &str = "No items found for this period.";
pub const OTHER_STORE: &str = "Other";
pub const KNOWN_STORES: &[&str] = &["Sunnyvale", "Milpitas", "Fremont"];

/// Today's date in the format records carry (`YYYY-MM-DD`, UTC).
pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub today: Vec<&'a InventoryRecord>,
    pub history: Vec<&'a InventoryRecord>,
}

impl<'a> Partition<'a> {
    pub fn tab(&self, tab: Tab) -> &[&'a InventoryRecord] {
        match tab {
            Tab::Today => &self.today,
            Tab::History => &self.history,
        }
    }
}

/// Split records into those dated `today` and everything else. Records with
/// no date land in history. Input order is kept within each side.
pub fn partition<'a>(records: &'a [InventoryRecord], today: &str) -> Partition<'a> {
    let (today, history): (Vec<_>, Vec<_>) = records
        .iter()
        .partition(|r| r.current_date() == Some(today));
    Partition { today, history }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Rows ready for display. Cells are `None` where the record lacks the field;
/// each output decides its own placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    pub columns: &'static [Column],
    pub rows: Vec<Vec<Option<String>>>,
}

impl TableModel {
    pub fn labels(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.label).collect()
    }

    /// Rows with missing cells replaced by `placeholder`.
    pub fn filled_rows(&self, placeholder: &str) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.clone().unwrap_or_else(|| placeholder.to_string()))
                    .collect()
            })
            .collect()
    }
}

/// Build the table for one partition. `None` means nothing to show and the
/// caller should display [`EMPTY_MESSAGE`] instead of a table.
pub fn render_table(kind: InventoryKind, records: &[&InventoryRecord]) -> Option<TableModel> {
    if records.is_empty() {
        return None;
    }
    let columns = kind.columns();
    let rows = display_order(records)
        .into_iter()
        .map(|record| columns.iter().map(|c| cell_text(c, record)).collect())
        .collect();
    Some(TableModel { columns, rows })
}

/// Most recent first by (date, time) when every record carries a time;
/// otherwise the order the server sent.
pub fn display_order<'a>(records: &[&'a InventoryRecord]) -> Vec<&'a InventoryRecord> {
    let mut ordered = records.to_vec();
    if ordered.iter().all(|r| r.current_time().is_some()) {
        ordered.sort_by(|a, b| {
            let ka = (a.current_date().unwrap_or(""), a.current_time().unwrap_or(""));
            let kb = (b.current_date().unwrap_or(""), b.current_time().unwrap_or(""));
            kb.cmp(&ka)
        });
    }
    ordered
}

pub fn cell_text(column: &Column, record: &InventoryRecord) -> Option<String> {
    let value = record.get(column.key)?;
    let text = match value {
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => match column.format {
            CellFormat::Date => short_date(s),
            CellFormat::Text => s.clone(),
        },
        Value::Object(_) | Value::Array(_) => value.to_string(),
        other => other.to_string(),
    };
    Some(text)
}

// ---------------------------------------------------------------------------
// Aggregates (waste)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StoreTotal {
    pub store: String,
    pub quantity: i64,
}

/// Quantities per known store plus `Other`, always in the same order.
pub fn aggregate_by_store(records: &[InventoryRecord]) -> Vec<StoreTotal> {
    let mut totals: Vec<StoreTotal> = KNOWN_STORES
        .iter()
        .chain(std::iter::once(&OTHER_STORE))
        .map(|s| StoreTotal {
            store: s.to_string(),
            quantity: 0,
        })
        .collect();
    let other = totals.len() - 1;

    for record in records {
        let idx = record
            .store_name()
            .and_then(|name| KNOWN_STORES.iter().position(|k| *k == name))
            .unwrap_or(other);
        totals[idx].quantity = totals[idx].quantity.saturating_add(record.quantity());
    }
    totals
}

/// date → store → quantity. Store names are kept as sent; records without a
/// store count under `Other`, records without a date under an empty label.
pub type DateStoreTotals = BTreeMap<String, BTreeMap<String, i64>>;

pub fn aggregate_by_date_and_store(records: &[InventoryRecord]) -> DateStoreTotals {
    let mut totals = DateStoreTotals::new();
    for record in records {
        let date = record.current_date().unwrap_or("").to_string();
        let store = record.store_name().unwrap_or(OTHER_STORE).to_string();
        let total = totals.entry(date).or_default().entry(store).or_insert(0);
        *total = total.saturating_add(record.quantity());
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record;
    use serde_json::json;

    fn waste(store: &str, qty: Value, date: &str) -> InventoryRecord {
        record(json!({"storeName": store, "quantity": qty, "currentDate": date}))
    }

    #[test]
    fn test_partition_splits_on_today() {
        let records = vec![
            record(json!({"currentDate": "2025-01-01", "productName": "A"})),
            record(json!({"currentDate": "2025-01-02", "productName": "B"})),
        ];
        let p = partition(&records, "2025-01-02");
        assert_eq!(p.today.len(), 1);
        assert_eq!(p.history.len(), 1);
        assert_eq!(p.today[0].get("productName"), Some(&json!("B")));
        assert_eq!(p.history[0].get("productName"), Some(&json!("A")));
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let records = vec![
            record(json!({"currentDate": "2025-01-02", "n": 1})),
            record(json!({"n": 2})),
            record(json!({"currentDate": null, "n": 3})),
            record(json!({"currentDate": "2024-12-31", "n": 4})),
            record(json!({"currentDate": "2025-01-02", "n": 5})),
        ];
        let p = partition(&records, "2025-01-02");
        assert_eq!(p.today.len() + p.history.len(), records.len());
        for r in &records {
            let in_today = p.today.iter().any(|x| std::ptr::eq(*x, r));
            let in_history = p.history.iter().any(|x| std::ptr::eq(*x, r));
            assert!(in_today ^ in_history);
        }
        assert_eq!(p.tab(Tab::Today).len(), 2);
    }

    #[test]
    fn test_empty_table_is_placeholder() {
        assert!(render_table(InventoryKind::Product, &[]).is_none());
        assert!(render_table(InventoryKind::Waste, &[]).is_none());
    }

    #[test]
    fn test_table_cells() {
        let r = record(json!({
            "_id": "abc",
            "productName": "Rice",
            "expiryDate": "2025-01-05T00:00:00.000Z",
            "isProductLost": false,
            "quantityPerCarton": 12,
            "vendorName": {"name": "Acme", "id": 4},
            "invoiceNumber": ""
        }));
        let table = render_table(InventoryKind::Product, &[&r]).unwrap();
        let cell = |key: &str| {
            let idx = table.columns.iter().position(|c| c.key == key).unwrap();
            table.rows[0][idx].clone()
        };
        assert_eq!(cell("productName").as_deref(), Some("Rice"));
        assert_eq!(cell("expiryDate").as_deref(), Some("Jan 5, 2025"));
        assert_eq!(cell("isProductLost").as_deref(), Some("false"));
        assert_eq!(cell("quantityPerCarton").as_deref(), Some("12"));
        assert_eq!(cell("vendorName").as_deref(), Some(r#"{"id":4,"name":"Acme"}"#));
        assert_eq!(cell("invoiceNumber"), None);
        assert_eq!(cell("username"), None);
        assert!(!table.labels().contains(&"_ID"));
        assert_eq!(table.filled_rows("-")[0].len(), table.columns.len());
    }

    #[test]
    fn test_sorted_newest_first_when_times_present() {
        let a = record(json!({"currentDate": "2025-01-01", "currentTime": "09:00:00", "n": "a"}));
        let b = record(json!({"currentDate": "2025-01-02", "currentTime": "08:00:00", "n": "b"}));
        let c = record(json!({"currentDate": "2025-01-02", "currentTime": "17:30:00", "n": "c"}));
        let ordered = display_order(&[&a, &b, &c]);
        let names: Vec<_> = ordered.iter().map(|r| r.get("n").unwrap().clone()).collect();
        assert_eq!(names, vec![json!("c"), json!("b"), json!("a")]);
    }

    #[test]
    fn test_fetch_order_kept_without_times() {
        let a = record(json!({"currentDate": "2025-01-01", "n": "a"}));
        let b = record(json!({"currentDate": "2025-01-03", "currentTime": "08:00:00", "n": "b"}));
        let ordered = display_order(&[&a, &b]);
        assert!(std::ptr::eq(ordered[0], &a));
        assert!(std::ptr::eq(ordered[1], &b));
    }

    #[test]
    fn test_aggregate_by_store_example() {
        let records = vec![
            record(json!({"storeName": "Sunnyvale", "quantity": "5"})),
            record(json!({"storeName": "Unknown", "quantity": "abc"})),
        ];
        let totals = aggregate_by_store(&records);
        let pairs: Vec<(&str, i64)> = totals.iter().map(|t| (t.store.as_str(), t.quantity)).collect();
        assert_eq!(
            pairs,
            vec![("Sunnyvale", 5), ("Milpitas", 0), ("Fremont", 0), ("Other", 0)]
        );
    }

    #[test]
    fn test_aggregate_by_store_sums_match_raw() {
        let records = vec![
            waste("Fremont", json!("3"), "2025-01-01"),
            waste("Fremont", json!(4), "2025-01-02"),
            waste("San Jose", json!("10"), "2025-01-02"),
            waste("Milpitas", json!(null), "2025-01-02"),
            record(json!({"quantity": "2"})),
        ];
        let totals = aggregate_by_store(&records);
        let sum: i64 = totals.iter().map(|t| t.quantity).sum();
        let raw: i64 = records.iter().map(InventoryRecord::quantity).sum();
        assert_eq!(sum, raw);
        assert_eq!(totals[2].quantity, 7);
        assert_eq!(totals[3].quantity, 12);
    }

    #[test]
    fn test_aggregates_saturate_instead_of_overflowing() {
        let records = vec![
            waste("Fremont", json!("9223372036854775807"), "2025-01-02"),
            waste("Fremont", json!("1"), "2025-01-02"),
        ];
        assert_eq!(aggregate_by_store(&records)[2].quantity, i64::MAX);
        assert_eq!(aggregate_by_date_and_store(&records)["2025-01-02"]["Fremont"], i64::MAX);
    }

    #[test]
    fn test_aggregate_by_date_and_store() {
        let records = vec![
            waste("Fremont", json!("3"), "2025-01-02"),
            waste("Fremont", json!("4"), "2025-01-02"),
            waste("Sunnyvale", json!("1"), "2025-01-01"),
            waste("San Jose", json!("x"), "2025-01-01"),
        ];
        let totals = aggregate_by_date_and_store(&records);
        let dates: Vec<_> = totals.keys().cloned().collect();
        assert_eq!(dates, vec!["2025-01-01", "2025-01-02"]);
        assert_eq!(totals["2025-01-02"]["Fremont"], 7);
        assert_eq!(totals["2025-01-01"]["Sunnyvale"], 1);
        assert_eq!(totals["2025-01-01"]["San Jose"], 0);
    }
}
