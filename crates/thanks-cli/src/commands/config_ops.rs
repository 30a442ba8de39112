use std::fs;
use std::path::Path;

use thanks_core::settings::{parse_settings_toml, Settings, SettingsError};

pub fn settings_export() {
    print!("{}", thanks_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(parse_settings_toml(&content), "Error: {}");
    println!("OK: {}", summary(&s));
}

/// Install a settings file for the rest of the process.
pub fn settings_load(path: &Path) {
    let content = die!(
        fs::read_to_string(path),
        "Error reading {}: {}",
        path.display()
    );
    die!(
        thanks_core::settings::init_custom(content),
        "Error in {}: {}",
        path.display()
    );
}

fn summary(s: &Settings) -> String {
    format!(
        "draft.max_content_chars={}, draft.max_mentions={}, search.min_query_chars={}, api.base_url={}",
        s.draft.max_content_chars, s.draft.max_mentions, s.search.min_query_chars, s.api.base_url
    )
}

/// Parse a settings file and describe it, without installing it.
pub fn check_file(path: &Path) -> Result<String, SettingsError> {
    let content = fs::read_to_string(path)
        .map_err(|e| SettingsError::Parse(format!("{}: {e}", path.display())))?;
    parse_settings_toml(&content).map(|s| summary(&s))
}
