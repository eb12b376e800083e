use std::path::PathBuf;

use crate::cli::report::load;
use crate::cli::Session;
use crate::error::{MandiError, Result};
use crate::models::{InventoryKind, Tab};

/// `mandi charts`: waste chart datasets for one page, as JSON.
pub fn run(session: &Session, page: u32, output: Option<String>) -> Result<()> {
    let viewer = load(session, InventoryKind::Waste, page, Tab::Today);
    if let Some(e) = viewer.failure() {
        return Err(e);
    }
    let charts = viewer
        .charts()
        .ok_or_else(|| MandiError::Other("charts are only available for waste inventory".into()))?;
    let json = serde_json::to_string_pretty(&charts)?;

    match output {
        Some(out) => {
            let path = PathBuf::from(out);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&path, format!("{json}\n"))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
