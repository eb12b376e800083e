use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::InventoryRecord;
use crate::reports::{aggregate_by_date_and_store, aggregate_by_store, DateStoreTotals, StoreTotal};

const PIE_COLORS: &[&str] = &["#FF6B6B", "#4ECDC4", "#45B7D1", "#FFD166"];
const PIE_BORDERS: &[&str] = &["#D9534F", "#3CA8A0", "#3A9BBF", "#E8B923"];
const BAR_BORDER: &str = "#1F2937";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<i64>,
    pub background_color: Vec<String>,
    pub border_color: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteCharts {
    pub store_totals: ChartData,
    pub date_totals: ChartData,
}

/// Build both waste charts from the full loaded page.
pub fn waste_charts(records: &[InventoryRecord]) -> WasteCharts {
    WasteCharts {
        store_totals: store_chart(&aggregate_by_store(records)),
        date_totals: date_chart(&aggregate_by_date_and_store(records)),
    }
}

pub fn store_chart(totals: &[StoreTotal]) -> ChartData {
    let pick = |palette: &[&str], i: usize| palette[i % palette.len()].to_string();
    ChartData {
        labels: totals.iter().map(|t| t.store.clone()).collect(),
        datasets: vec![Dataset {
            label: "Waste Quantities by Store".to_string(),
            data: totals.iter().map(|t| t.quantity).collect(),
            background_color: (0..totals.len()).map(|i| pick(PIE_COLORS, i)).collect(),
            border_color: (0..totals.len()).map(|i| pick(PIE_BORDERS, i)).collect(),
        }],
    }
}

/// Grouped bars: one label per date, one series per store seen on any date.
pub fn date_chart(totals: &DateStoreTotals) -> ChartData {
    let labels: Vec<String> = totals.keys().cloned().collect();
    let mut stores: Vec<&String> = totals.values().flat_map(|by_store| by_store.keys()).collect();
    stores.sort();
    stores.dedup();

    let datasets = stores
        .into_iter()
        .map(|store| Dataset {
            label: store.clone(),
            data: totals
                .values()
                .map(|by_store| by_store.get(store).copied().unwrap_or(0))
                .collect(),
            background_color: vec![series_color(store)],
            border_color: vec![BAR_BORDER.to_string()],
        })
        .collect();

    ChartData { labels, datasets }
}

/// Stable `#RRGGBB` colour for a category name.
pub fn series_color(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    format!("#{}", hex::encode_upper(&digest[..3]))
}

/// Split a `#RRGGBB` string into components, for terminal rendering.
pub fn rgb(color: &str) -> Option<(u8, u8, u8)> {
    let bytes = hex::decode(color.strip_prefix('#')?).ok()?;
    match bytes.as_slice() {
        [r, g, b] => Some((*r, *g, *b)),
        _ => None,
    }
}
