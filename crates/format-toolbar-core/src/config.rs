//! Synchronizer configuration.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Zero-width space inserted when a format is toggled at a collapsed caret.
pub const DEFAULT_PLACEHOLDER: &str = "\u{200B}";

/// Default time allowed for focus to settle before a deferred command resumes.
pub const DEFAULT_FOCUS_SETTLE_DELAY_MS: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Delay before the deferred half of a command runs when the surface had
    /// to be focused first. `0` continues synchronously.
    pub focus_settle_delay_ms: u32,
    /// Text a host inserts to carry a format at a collapsed caret. Hosts
    /// read it when they are built from the config.
    pub placeholder: SmolStr,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            focus_settle_delay_ms: DEFAULT_FOCUS_SETTLE_DELAY_MS,
            placeholder: SmolStr::new_static(DEFAULT_PLACEHOLDER),
        }
    }
}

impl SyncConfig {
    /// Config that never defers; used by hosts whose focus is synchronous.
    pub fn synchronous() -> Self {
        Self {
            focus_settle_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn defers_after_focus(&self) -> bool {
        self.focus_settle_delay_ms > 0
    }
}
