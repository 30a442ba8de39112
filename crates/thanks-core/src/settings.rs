//! Global settings loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::sync::OnceLock;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub draft: DraftSettings,
    pub report: ReportSettings,
    pub search: SearchSettings,
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftSettings {
    pub max_content_chars: usize,
    pub max_mentions: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    pub max_reason_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    pub min_query_chars: usize,
    pub debounce_ms: u64,
    pub max_candidates: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive!(draft.max_content_chars);
    check_positive!(draft.max_mentions);
    check_positive!(report.max_reason_chars);
    check_positive!(search.min_query_chars);
    check_positive!(search.max_candidates);
    check_positive!(api.timeout_secs);

    if s.api.base_url.trim().is_empty() {
        return Err(SettingsError::InvalidValue {
            field: "api.base_url".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if !(s.api.base_url.starts_with("http://") || s.api.base_url.starts_with("https://")) {
        return Err(SettingsError::InvalidValue {
            field: "api.base_url".to_string(),
            reason: "must start with http:// or https://".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_toml() {
        let s = parse_settings_toml(DEFAULT_SETTINGS_TOML).unwrap();
        assert_eq!(s.draft.max_content_chars, 140);
        assert_eq!(s.draft.max_mentions, 3);
        assert_eq!(s.report.max_reason_chars, 255);
        assert_eq!(s.search.min_query_chars, 2);
        assert_eq!(s.search.debounce_ms, 300);
        assert_eq!(s.search.max_candidates, 20);
        assert_eq!(s.api.base_url, "http://localhost:8000");
        assert_eq!(s.api.timeout_secs, 10);
    }

    #[test]
    fn parse_valid_custom_toml() {
        let toml = r#"
[draft]
max_content_chars = 280
max_mentions = 5

[report]
max_reason_chars = 500

[search]
min_query_chars = 1
debounce_ms = 0
max_candidates = 50

[api]
base_url = "https://thanks.example.com"
timeout_secs = 30
"#;
        let s = parse_settings_toml(toml).unwrap();
        assert_eq!(s.draft.max_content_chars, 280);
        assert_eq!(s.search.debounce_ms, 0);
        assert_eq!(s.api.base_url, "https://thanks.example.com");
    }

    #[test]
    fn error_zero_limit() {
        let toml = DEFAULT_SETTINGS_TOML.replace("max_mentions = 3", "max_mentions = 0");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(
            matches!(err, SettingsError::InvalidValue { ref field, .. } if field == "draft.max_mentions"),
            "got {err}"
        );
    }

    #[test]
    fn error_bad_base_url() {
        let toml = DEFAULT_SETTINGS_TOML.replace("http://localhost:8000", "localhost:8000");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { ref field, .. } if field == "api.base_url"));
    }

    #[test]
    fn error_missing_section() {
        let err = parse_settings_toml("[draft]\nmax_content_chars = 1\nmax_mentions = 1\n").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
