use std::time::Duration;

use serde_json::Value;

use crate::error::{MandiError, Result};
use crate::models::{InventoryKind, InventoryPage, InventoryRecord};

/// Record array names the inventory endpoints are known to use.
const RECORD_KEYS: &[&str] = &["productInventoryData", "data", "items"];

/// Read access to one page of inventory records.
pub trait InventoryApi: Send + Sync {
    fn fetch_page(&self, kind: InventoryKind, page: u32, limit: u32) -> Result<InventoryPage>;
}

pub struct HttpInventoryApi {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpInventoryApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn url_for(&self, kind: InventoryKind) -> String {
        format!("{}/{}", self.base_url, kind.endpoint())
    }
}

impl InventoryApi for HttpInventoryApi {
    fn fetch_page(&self, kind: InventoryKind, page: u32, limit: u32) -> Result<InventoryPage> {
        let url = self.url_for(kind);
        log::debug!("GET {url} page={page} limit={limit}");

        let response = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .query("page", &page.to_string())
            .query("limit", &limit.to_string())
            .call();

        let response = match response {
            Ok(r) => r,
            Err(ureq::Error::Status(code, _)) => return Err(MandiError::Status(code)),
            Err(e) => return Err(MandiError::Transport(e.to_string())),
        };

        let content_type = response.header("content-type").map(str::to_string);
        let body = response
            .into_string()
            .map_err(|e| MandiError::Transport(format!("reading response body: {e}")))?;
        parse_page(kind, content_type.as_deref(), &body, page)
    }
}

/// Validate and decode an inventory listing response.
///
/// A wrong content type or a body that is not a JSON object is an error; a
/// missing or empty record array is an empty page with `total_pages` forced
/// to 1. Missing cursor fields fall back to the requested page.
pub fn parse_page(
    kind: InventoryKind,
    content_type: Option<&str>,
    body: &str,
    requested_page: u32,
) -> Result<InventoryPage> {
    let ct = content_type.unwrap_or("");
    if !ct.to_ascii_lowercase().contains("application/json") {
        return Err(MandiError::NotJson(if ct.is_empty() {
            "none".to_string()
        } else {
            ct.to_string()
        }));
    }

    let value: Value = serde_json::from_str(body)?;
    let obj = value
        .as_object()
        .ok_or_else(|| MandiError::Malformed("expected a JSON object".into()))?;

    let array = std::iter::once(kind.records_key())
        .chain(RECORD_KEYS.iter().copied())
        .find_map(|key| obj.get(key).and_then(Value::as_array));

    let records: Vec<InventoryRecord> = match array {
        Some(items) => items
            .iter()
            .filter_map(|item| item.as_object().cloned().map(InventoryRecord::from))
            .collect(),
        None => Vec::new(),
    };

    if records.is_empty() {
        return Ok(InventoryPage {
            records,
            current_page: requested_page,
            total_pages: 1,
        });
    }

    let current_page = page_number(obj.get("currentPage")).unwrap_or(requested_page);
    let total_pages = page_number(obj.get("totalPages")).unwrap_or(current_page).max(1);
    Ok(InventoryPage {
        records,
        current_page,
        total_pages,
    })
}

/// Page numbers arrive as numbers or numeric strings depending on the route.
fn page_number(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n| *n >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: Option<&str> = Some("application/json; charset=utf-8");

    #[test]
    fn test_parses_product_page() {
        let body = r#"{"productInventoryData":[{"productName":"Rice"},{"productName":"Dal"}],
                       "currentPage":2,"totalPages":3}"#;
        let page = parse_page(InventoryKind::Product, JSON, body, 2).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_parses_waste_page_with_data_key() {
        let body = r#"{"data":[{"storeName":"Fremont","quantity":"2"}],"currentPage":1,"totalPages":1}"#;
        let page = parse_page(InventoryKind::Waste, JSON, body, 1).unwrap();
        assert_eq!(page.records.len(), 1);
    }

    #[test]
    fn test_accepts_items_key_for_either_kind() {
        let body = r#"{"items":[{"productName":"Rice"}],"currentPage":1,"totalPages":4}"#;
        let page = parse_page(InventoryKind::Product, JSON, body, 1).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.total_pages, 4);
    }

    #[test]
    fn test_empty_items_forces_single_page() {
        let body = r#"{"items":[],"currentPage":1,"totalPages":7}"#;
        let page = parse_page(InventoryKind::Waste, JSON, body, 3).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 3);
    }

    #[test]
    fn test_missing_array_is_empty_not_error() {
        let body = r#"{"message":"nothing"}"#;
        let page = parse_page(InventoryKind::Product, JSON, body, 1).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_rejects_non_json_content_type() {
        let err = parse_page(InventoryKind::Waste, Some("text/html"), "<html>", 1).unwrap_err();
        assert!(matches!(err, MandiError::NotJson(_)));
        let err = parse_page(InventoryKind::Waste, None, "{}", 1).unwrap_err();
        assert!(matches!(err, MandiError::NotJson(_)));
    }

    #[test]
    fn test_rejects_malformed_body() {
        let err = parse_page(InventoryKind::Waste, JSON, "{not json", 1).unwrap_err();
        assert!(err.is_fetch_failure());
    }

    #[test]
    fn test_string_cursor_fields() {
        let body = r#"{"data":[{"a":1}],"currentPage":"2","totalPages":"5"}"#;
        let page = parse_page(InventoryKind::Waste, JSON, body, 1).unwrap();
        assert_eq!((page.current_page, page.total_pages), (2, 5));
    }
}
