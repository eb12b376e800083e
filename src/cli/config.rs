use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, Settings};

pub fn show() -> Result<()> {
    let settings = load_settings();
    println!("Settings file: {}", settings_path().display());
    print!("{}", format_settings(&settings));
    Ok(())
}

pub fn set(
    api_url: Option<String>,
    export_dir: Option<String>,
    page_size: Option<u32>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let mut settings = load_settings();
    apply(&mut settings, api_url, export_dir, page_size, timeout_secs);
    save_settings(&settings)?;
    println!("Saved {}", settings_path().display());
    Ok(())
}

fn apply(
    settings: &mut Settings,
    api_url: Option<String>,
    export_dir: Option<String>,
    page_size: Option<u32>,
    timeout_secs: Option<u64>,
) {
    if let Some(url) = api_url {
        settings.api_base_url = url.trim().trim_end_matches('/').to_string();
    }
    if let Some(dir) = export_dir {
        settings.export_dir = dir;
    }
    if let Some(n) = page_size {
        settings.page_size = n;
    }
    if let Some(t) = timeout_secs {
        settings.timeout_secs = t;
    }
}

fn format_settings(settings: &Settings) -> String {
    format!(
        "  api_base_url: {}\n  export_dir:   {}\n  page_size:    {}\n  timeout_secs: {}\n",
        settings.api_base_url, settings.export_dir, settings.page_size, settings.timeout_secs
    )
}
