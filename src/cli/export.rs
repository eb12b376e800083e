use std::path::PathBuf;

use crate::cli::report::load;
use crate::cli::Session;
use crate::error::Result;
use crate::models::{InventoryKind, Tab};

/// `mandi export`: write one tab of one page to CSV. Only the requested page
/// is exported, not the whole backend dataset.
pub fn run(
    session: &Session,
    kind: InventoryKind,
    page: u32,
    tab: Tab,
    output: Option<String>,
) -> Result<()> {
    let viewer = load(session, kind, page, tab);
    if let Some(e) = viewer.failure() {
        return Err(e);
    }
    let output = output.map(PathBuf::from);
    let path = viewer.export_csv(&session.settings.export_path(), output.as_deref())?;
    println!(
        "Wrote {} ({} {} rows, {})",
        path.display(),
        viewer.visible().len(),
        tab.slug(),
        viewer.page_label()
    );
    Ok(())
}
