//! Format identifiers and the derived format-state snapshot.
//!
//! `Format` is the fixed, enumerable set of inline styles the toolbar can
//! toggle. `FormatState` records which of them are active at the current
//! selection. It is always derived from the surface, never edited by hand
//! outside this crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// A toggleable inline style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Bold,
    Italic,
    Underline,
}

impl Format {
    /// Every supported format, in toolbar order.
    pub const ALL: [Format; 3] = [Format::Bold, Format::Italic, Format::Underline];

    /// Stable identifier used by the presentation layer (`"bold"` etc.).
    pub fn id(self) -> &'static str {
        match self {
            Format::Bold => "bold",
            Format::Italic => "italic",
            Format::Underline => "underline",
        }
    }

    /// Name of the matching native editing command.
    pub fn command_name(self) -> &'static str {
        // execCommand names happen to match the ids for this set.
        self.id()
    }

    /// Markup tag used when serialising content from the in-memory surface.
    pub fn tag(self) -> &'static str {
        match self {
            Format::Bold => "b",
            Format::Italic => "i",
            Format::Underline => "u",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Format {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bold" => Ok(Format::Bold),
            "italic" => Ok(Format::Italic),
            "underline" => Ok(Format::Underline),
            _ => Err(FormatError::UnknownFormat(s.into())),
        }
    }
}

/// Which formats are active for the current selection.
///
/// Serialises as `{ "bold": bool, "italic": bool, "underline": bool }`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl FormatState {
    /// State with every format inactive.
    pub const NONE: Self = Self {
        bold: false,
        italic: false,
        underline: false,
    };

    /// Build a state from the formats that are active.
    pub fn from_active(active: impl IntoIterator<Item = Format>) -> Self {
        let mut state = Self::NONE;
        for format in active {
            state.set(format, true);
        }
        state
    }

    /// Build a state by asking `probe` about every supported format.
    pub fn derive(mut probe: impl FnMut(Format) -> bool) -> Self {
        let mut state = Self::NONE;
        for format in Format::ALL {
            state.set(format, probe(format));
        }
        state
    }

    pub fn is_active(&self, format: Format) -> bool {
        match format {
            Format::Bold => self.bold,
            Format::Italic => self.italic,
            Format::Underline => self.underline,
        }
    }

    pub(crate) fn set(&mut self, format: Format, active: bool) {
        match format {
            Format::Bold => self.bold = active,
            Format::Italic => self.italic = active,
            Format::Underline => self.underline = active,
        }
    }

    /// Same state with `format` flipped.
    pub fn toggled(mut self, format: Format) -> Self {
        self.set(format, !self.is_active(format));
        self
    }

    /// Same state with every format in `formats` switched off.
    pub fn without(mut self, formats: &[Format]) -> Self {
        for format in formats {
            self.set(*format, false);
        }
        self
    }

    /// True when no format is active.
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Iterate `(format, active)` pairs in toolbar order.
    pub fn iter(&self) -> impl Iterator<Item = (Format, bool)> + '_ {
        Format::ALL.into_iter().map(|f| (f, self.is_active(f)))
    }

    /// Iterate only the active formats.
    pub fn active(&self) -> impl Iterator<Item = Format> + '_ {
        self.iter().filter_map(|(f, on)| on.then_some(f))
    }
}

/// Payload of the "format changed" notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FormatChange {
    pub formats: FormatState,
    pub continuous: bool,
}
