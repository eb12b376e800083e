use serde::Deserialize;
use serde_json::{Map, Value};

pub const DATE_FIELD: &str = "currentDate";
pub const TIME_FIELD: &str = "currentTime";
pub const STORE_FIELD: &str = "storeName";
pub const QUANTITY_FIELD: &str = "quantity";

/// How a column's raw value is turned into display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    Text,
    /// Rendered as a short date (`Jan 5, 2025`).
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub format: CellFormat,
}

const fn text(key: &'static str, label: &'static str) -> Column {
    Column { key, label, format: CellFormat::Text }
}

const fn date(key: &'static str, label: &'static str) -> Column {
    Column { key, label, format: CellFormat::Date }
}

const PRODUCT_COLUMNS: &[Column] = &[
    text("productName", "PRODUCT NAME"),
    text("barcodeOrSKU", "BARCODE OR SKU"),
    text("vendorName", "VENDOR NAME"),
    text("invoiceNumber", "INVOICE NUMBER"),
    text("quantityPerCarton", "QUANTITY PER CARTON"),
    text("noOfCarton", "NO OF CARTON"),
    date("expiryDate", "EXPIRY DATE"),
    text("isProductLost", "IS PRODUCT LOST"),
    text("isTaken", "IS TAKEN"),
    text("username", "USERNAME"),
    text("establishment", "ESTABLISHMENT"),
    text("role", "ROLE"),
    text("imagery", "IMAGERY"),
    text(DATE_FIELD, "CURRENT DATE"),
    text(TIME_FIELD, "CURRENT TIME"),
];

const WASTE_COLUMNS: &[Column] = &[
    text(STORE_FIELD, "STORE NAME"),
    text("productName", "PRODUCT NAME"),
    text("barcodeOrSKU", "BARCODE OR SKU"),
    text(QUANTITY_FIELD, "QUANTITY"),
    text("quantityPerCarton", "QUANTITY PER CARTON"),
    text("establishment", "ESTABLISHMENT"),
    text("username", "USERNAME"),
    text("role", "ROLE"),
    text(DATE_FIELD, "CURRENT DATE"),
    text(TIME_FIELD, "CURRENT TIME"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InventoryKind {
    Product,
    Waste,
}

impl InventoryKind {
    pub fn columns(self) -> &'static [Column] {
        match self {
            InventoryKind::Product => PRODUCT_COLUMNS,
            InventoryKind::Waste => WASTE_COLUMNS,
        }
    }

    /// Path of the listing endpoint, relative to the API base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            InventoryKind::Product => "inventory/getProductInventory",
            InventoryKind::Waste => "inventory/getWasteInventory",
        }
    }

    /// Name of the record array this kind's endpoint answers with. Other
    /// known names are accepted as a fallback.
    pub fn records_key(self) -> &'static str {
        match self {
            InventoryKind::Product => "productInventoryData",
            InventoryKind::Waste => "data",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            InventoryKind::Product => "product",
            InventoryKind::Waste => "waste",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            InventoryKind::Product => "Product Inventory",
            InventoryKind::Waste => "Waste Inventory",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Tab {
    #[default]
    Today,
    History,
}

impl Tab {
    pub fn slug(self) -> &'static str {
        match self {
            Tab::Today => "today",
            Tab::History => "history",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Today => "Today",
            Tab::History => "History",
        }
    }

    pub fn toggled(self) -> Tab {
        match self {
            Tab::Today => Tab::History,
            Tab::History => Tab::Today,
        }
    }
}

/// One inventory record exactly as the backend sent it.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct InventoryRecord(Map<String, Value>);

impl InventoryRecord {
    /// Field value, with JSON `null` treated the same as a missing field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn current_date(&self) -> Option<&str> {
        self.get_str(DATE_FIELD)
    }

    pub fn current_time(&self) -> Option<&str> {
        self.get_str(TIME_FIELD)
    }

    pub fn store_name(&self) -> Option<&str> {
        self.get_str(STORE_FIELD)
    }

    /// Quantity read the way a lenient integer parse would: leading digits
    /// of a string, the integer part of a number, zero otherwise.
    pub fn quantity(&self) -> i64 {
        match self.get(QUANTITY_FIELD) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => parse_int_prefix(s),
            _ => 0,
        }
    }
}

impl From<Map<String, Value>> for InventoryRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn parse_int_prefix(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for d in rest.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(d - b'0');
        value = value.saturating_mul(10).saturating_add(d);
    }
    if negative {
        -value
    } else {
        value
    }
}

/// One page of records plus the server's authoritative cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryPage {
    pub records: Vec<InventoryRecord>,
    pub current_page: u32,
    pub total_pages: u32,
}

impl InventoryPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn record(value: Value) -> InventoryRecord {
    match value {
        Value::Object(map) => InventoryRecord::from(map),
        other => panic!("test record must be an object, got {other}"),
    }
}
