use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

// ── Input symbols ────────────────────────────────────────────────

/// Sigils and delimiters recognised by the lexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Symbols {
    pub identifier: char,
    pub special_identifier: char,
    pub inline_start: char,
    pub inline_end: char,
    pub index_start: char,
    pub index_end: char,
    pub concatenate: char,
    pub string: char,
    /// Property access operator. May be longer than one character.
    pub property: String,
}

impl Default for Symbols {
    fn default() -> Self {
        Self {
            identifier: '$',
            special_identifier: '@',
            inline_start: '{',
            inline_end: '}',
            index_start: '[',
            index_end: ']',
            concatenate: '.',
            string: '\'',
            property: "->".to_string(),
        }
    }
}

// ── Console settings ─────────────────────────────────────────────

/// Console settings, stored as JSON next to the host application's config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ConsoleSettings {
    pub version: u32,
    pub symbols: Symbols,
    /// Number of entries kept by the message log before the oldest is evicted.
    pub scrollback: usize,
    /// Name of the global that holds the previous result. The default empty
    /// name makes a bare `@` read it.
    pub last_result: String,
}

const SETTINGS_VERSION: u32 = 1;

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            symbols: Symbols::default(),
            scrollback: 100,
            last_result: String::new(),
        }
    }
}

impl ConsoleSettings {
    pub fn json_schema() -> serde_json::Value {
        let root = schemars::schema_for!(ConsoleSettings);
        serde_json::to_value(root).unwrap_or_default()
    }
}

/// Load settings from `path`. Returns None if the file is missing or unreadable.
pub fn load_settings(path: &Path) -> Option<ConsoleSettings> {
    if !path.exists() {
        return None;
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| tracing::warn!(path = %path.display(), "failed to read settings: {e}"))
        .ok()?;
    let settings: ConsoleSettings = serde_json::from_str(&text)
        .map_err(|e| tracing::warn!(path = %path.display(), "invalid settings file: {e}"))
        .ok()?;
    if settings.version > SETTINGS_VERSION {
        tracing::warn!(
            version = settings.version,
            "settings written by a newer version, unknown fields are ignored"
        );
    }
    Some(settings)
}

/// Save settings to `path`, creating parent directories as needed.
pub fn save_settings(path: &Path, settings: &ConsoleSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console").join("settings.json");

        let mut settings = ConsoleSettings::default();
        settings.scrollback = 12;
        settings.symbols.property = ":".to_string();
        save_settings(&path, &settings).unwrap();

        let loaded = load_settings(&path).expect("should load");
        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "symbols": { "string": "\"" } }"#).unwrap();

        let loaded = load_settings(&path).expect("should load");
        assert_eq!(loaded.symbols.string, '"');
        assert_eq!(loaded.symbols.identifier, '$');
        assert_eq!(loaded.scrollback, 100);
    }

    #[test]
    fn load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(&dir.path().join("nope.json")).is_none());
    }

    #[test]
    fn load_garbage_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_settings(&path).is_none());
    }

    #[test]
    fn schema_names_symbols() {
        let schema = ConsoleSettings::json_schema();
        assert!(schema["properties"]["symbols"].is_object());
    }
}
