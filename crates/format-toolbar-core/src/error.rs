//! Error types for selection tracking and format commands.
//!
//! None of these escape a public command: the synchronizer logs them and
//! converts them into a boolean outcome plus a fresh state derivation.

use smol_str::SmolStr;
use thiserror::Error;

use crate::platform::PlatformError;

/// Errors that can occur while tracking selections or running commands.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FormatError {
    /// No live selection, or it lies outside the editable surface.
    #[error("no selection inside the editable surface")]
    SelectionUnavailable,

    /// The host rejected re-applying a stored range.
    #[error("failed to restore selection: {0}")]
    RestoreFailed(PlatformError),

    /// The native toggle/clear primitive failed.
    #[error("format primitive failed: {0}")]
    PrimitiveFailed(PlatformError),

    /// Identifier outside the supported format set.
    #[error("unknown format: {0}")]
    UnknownFormat(SmolStr),
}
