//! Platform abstraction traits for selection and formatting.
//!
//! These traits define the interface between the synchronization engine and
//! the host that owns the editable surface (browser DOM, headless model,
//! etc.). The engine drives the host's native formatting primitive but never
//! reimplements it.

use std::fmt;

use crate::format::Format;

/// Error type for platform operations.
#[derive(Debug, Clone)]
pub struct PlatformError(pub String);

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// A host range handle that can be cloned and inspected.
pub trait RangeHandle: Clone + fmt::Debug {
    /// True when the range is an empty caret.
    fn is_collapsed(&self) -> bool;
}

/// Access to the host's single, shared live selection.
///
/// The live selection is an ambient resource shared with the rest of the
/// page, so callers must check `contains_range` on every read.
pub trait SelectionPlatform {
    type Range: RangeHandle;

    /// The first range of the live selection, cloned. None when there is no
    /// selection at all.
    fn live_range(&self) -> Option<Self::Range>;

    /// Whether `range` lies inside the editable surface.
    ///
    /// Implementations must accept both a container that is itself inside
    /// the surface and a text-node container whose parent is.
    fn contains_range(&self, range: &Self::Range) -> bool;

    /// Make `range` the live selection.
    ///
    /// Fails when the range no longer refers to nodes in the document.
    fn select_range(&mut self, range: &Self::Range) -> Result<(), PlatformError>;
}

/// The host editing surface and its native formatting primitive.
pub trait FormatPlatform: SelectionPlatform {
    /// Whether the surface is the active focus target.
    fn is_focused(&self) -> bool;

    /// Move focus to the surface. Focus may settle asynchronously.
    fn focus(&mut self) -> Result<(), PlatformError>;

    /// Toggle `format` on the live selection.
    ///
    /// At a collapsed caret the host inserts placeholder text carrying the
    /// format so subsequent typing continues in it.
    fn toggle_format(&mut self, format: Format) -> Result<(), PlatformError>;

    /// Remove every format in `formats` from the live selection.
    fn clear_formats(&mut self, formats: &[Format]) -> Result<(), PlatformError>;

    /// Whether `format` is rendered at the live selection.
    fn query_format(&self, format: Format) -> bool;

    /// Serialized markup of the whole surface.
    fn serialized_content(&self) -> String;
}
