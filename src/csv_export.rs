use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{InventoryKind, InventoryRecord, Tab};
use crate::reports::render_table;

pub const MISSING: &str = "N/A";

/// Default file name for an export: `waste_inventory_today.csv`.
pub fn file_name(kind: InventoryKind, tab: Tab) -> String {
    format!("{}_inventory_{}.csv", kind.slug(), tab.slug())
}

/// Write the visible partition as CSV. Uses the same columns, row order and
/// cell formatting as the table; an empty partition yields the header only.
pub fn write_csv<W: Write>(writer: W, kind: InventoryKind, records: &[&InventoryRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let labels: Vec<&str> = kind.columns().iter().map(|c| c.label).collect();
    wtr.write_record(&labels)?;
    if let Some(table) = render_table(kind, records) {
        for row in table.filled_rows(MISSING) {
            wtr.write_record(&row)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Export to `output`, or to `<export_dir>/<kind>_inventory_<tab>.csv`.
pub fn export_to_file(
    kind: InventoryKind,
    tab: Tab,
    records: &[&InventoryRecord],
    export_dir: &Path,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| export_dir.join(file_name(kind, tab)));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(&path)?;
    write_csv(std::io::BufWriter::new(file), kind, records)?;
    log::info!("exported {} {} rows to {}", records.len(), tab.slug(), path.display());
    Ok(path)
}
