//! Types exposed to JavaScript via wasm-bindgen.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use format_toolbar_browser::{FormatChange, FormatState, SmolStr, SyncConfig};

/// Options accepted by the `FormatToolbar` constructor. Every field is
/// optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolbarOptions {
    /// Milliseconds to wait for focus to settle before running a command.
    /// `0` runs commands synchronously.
    #[tsify(optional)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_settle_delay_ms: Option<u32>,
    /// Text inserted when a format is toggled at a collapsed caret.
    #[tsify(optional)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Console log level: `"trace"`, `"debug"`, `"info"`, `"warn"` or `"error"`.
    #[tsify(optional)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl ToolbarOptions {
    /// Read options from an optional JS object.
    pub fn parse(value: JsValue) -> Result<Self, JsError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| JsError::new(&format!("Invalid options: {}", e)))
    }

    pub fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::default();
        if let Some(delay) = self.focus_settle_delay_ms {
            config.focus_settle_delay_ms = delay;
        }
        if let Some(placeholder) = &self.placeholder {
            config.placeholder = SmolStr::new(placeholder);
        }
        config
    }

    pub fn log_level(&self) -> Result<Level, String> {
        match &self.log_level {
            Some(level) => Level::from_str(level).map_err(|e| format!("{level:?}: {e}")),
            None => Ok(Level::INFO),
        }
    }
}

/// Active formats at the current selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct JsFormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl From<FormatState> for JsFormatState {
    fn from(state: FormatState) -> Self {
        Self {
            bold: state.bold,
            italic: state.italic,
            underline: state.underline,
        }
    }
}

/// Payload passed to the `onChange` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct JsFormatChange {
    pub formats: JsFormatState,
    /// Whether the next typed text picks up the active formats.
    pub continuous: bool,
}

impl From<FormatChange> for JsFormatChange {
    fn from(change: FormatChange) -> Self {
        Self {
            formats: change.formats.into(),
            continuous: change.continuous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use format_toolbar_browser::Format;

    #[test]
    fn test_default_options_use_default_config() {
        let options = ToolbarOptions::default();
        let config = options.sync_config();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(options.log_level().unwrap(), Level::INFO);
    }

    #[test]
    fn test_options_override_config() {
        let options = ToolbarOptions {
            focus_settle_delay_ms: Some(0),
            placeholder: Some("\u{FEFF}".into()),
            log_level: Some("debug".into()),
        };
        let config = options.sync_config();
        assert_eq!(config.focus_settle_delay_ms, 0);
        assert!(!config.defers_after_focus());
        assert_eq!(config.placeholder, "\u{FEFF}");
        assert_eq!(options.log_level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_bad_log_level_is_rejected() {
        let options = ToolbarOptions {
            log_level: Some("loud".into()),
            ..Default::default()
        };
        assert!(options.log_level().is_err());
    }

    #[test]
    fn test_change_payload_mirrors_core() {
        let change = FormatChange {
            formats: FormatState::from_active([Format::Bold, Format::Underline]),
            continuous: true,
        };
        let js = JsFormatChange::from(change);
        assert!(js.formats.bold);
        assert!(!js.formats.italic);
        assert!(js.formats.underline);
        assert!(js.continuous);
    }
}
