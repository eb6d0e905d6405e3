//! Headless editable surface.
//!
//! `MemorySurface` implements the platform traits without a DOM: text lives
//! in a rope and every character carries its own `FormatState`. It mirrors
//! how the browser's native primitive behaves closely enough to drive the
//! synchronizer in native tests and non-browser hosts.

use ropey::Rope;
use smol_str::SmolStr;

use crate::config::{DEFAULT_PLACEHOLDER, SyncConfig};
use crate::format::{Format, FormatState};
use crate::platform::{FormatPlatform, PlatformError, RangeHandle, SelectionPlatform};

/// Identifier of a node in the headless document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// The editable surface element itself.
pub const SURFACE_NODE: NodeId = NodeId(0);

/// Node a range is anchored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryContainer {
    /// An element node.
    Element(NodeId),
    /// A text node, identified by its parent element.
    Text { parent: NodeId },
}

/// Range over the headless surface, in char offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryRange {
    pub container: MemoryContainer,
    pub start: usize,
    pub end: usize,
    /// Content generation the range was created against.
    generation: u64,
}

impl RangeHandle for MemoryRange {
    fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

pub struct MemorySurface {
    text: Rope,
    marks: Vec<FormatState>,
    live: Option<MemoryRange>,
    focused: bool,
    focus_requests: usize,
    generation: u64,
    placeholder: SmolStr,
}

impl MemorySurface {
    /// A focused surface holding unformatted `text` with no selection.
    pub fn new(text: &str) -> Self {
        let text = Rope::from_str(text);
        let marks = vec![FormatState::NONE; text.len_chars()];
        Self {
            text,
            marks,
            live: None,
            focused: true,
            focus_requests: 0,
            generation: 0,
            placeholder: SmolStr::new_static(DEFAULT_PLACEHOLDER),
        }
    }

    /// A surface built from formatted runs.
    pub fn from_runs(runs: &[(&str, FormatState)]) -> Self {
        let mut surface = Self::new("");
        for (text, state) in runs {
            let at = surface.text.len_chars();
            surface.text.insert(at, text);
            surface
                .marks
                .extend(std::iter::repeat_n(*state, text.chars().count()));
        }
        surface
    }

    /// Apply the host-side settings of `config`, as `BrowserSurface::new` does.
    pub fn with_config(self, config: &SyncConfig) -> Self {
        self.with_placeholder(config.placeholder.clone())
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<SmolStr>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    /// Formats carried by the character at `offset`.
    pub fn marks_at(&self, offset: usize) -> Option<FormatState> {
        self.marks.get(offset).copied()
    }

    pub fn live(&self) -> Option<&MemoryRange> {
        self.live.as_ref()
    }

    /// Select `start..end` in the surface's text.
    pub fn select(&mut self, start: usize, end: usize) {
        self.select_in(MemoryContainer::Text { parent: SURFACE_NODE }, start, end);
    }

    /// Select `start..end` anchored in an arbitrary container.
    pub fn select_in(&mut self, container: MemoryContainer, start: usize, end: usize) {
        let len = self.text.len_chars();
        let (start, end) = (start.min(end).min(len), start.max(end).min(len));
        self.live = Some(MemoryRange {
            container,
            start,
            end,
            generation: self.generation,
        });
    }

    /// Move the live selection to an element outside the surface.
    pub fn select_outside(&mut self, node: NodeId) {
        self.live = Some(MemoryRange {
            container: MemoryContainer::Element(node),
            start: 0,
            end: 0,
            generation: self.generation,
        });
    }

    pub fn clear_live_selection(&mut self) {
        self.live = None;
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// How many times `focus` was requested.
    pub fn focus_requests(&self) -> usize {
        self.focus_requests
    }

    /// Replace all content. Ranges created before this no longer apply.
    pub fn replace_text(&mut self, text: &str) {
        self.text = Rope::from_str(text);
        self.marks = vec![FormatState::NONE; self.text.len_chars()];
        self.generation += 1;
        self.live = None;
    }

    fn live_in_surface(&self) -> Result<MemoryRange, PlatformError> {
        let range = self.live.clone().ok_or("no selection")?;
        if !self.contains_range(&range) {
            return Err("selection is not inside the editable surface".into());
        }
        Ok(range)
    }

    /// Formats a caret at `offset` types with: the character before it, or
    /// the one after when at the very start.
    fn caret_marks(&self, offset: usize) -> FormatState {
        offset
            .checked_sub(1)
            .and_then(|prev| self.marks.get(prev))
            .or_else(|| self.marks.get(offset))
            .copied()
            .unwrap_or_default()
    }

    /// Char span of a placeholder ending right at `offset`, if there is one.
    fn placeholder_before(&self, offset: usize) -> Option<std::ops::Range<usize>> {
        let len = self.placeholder.chars().count();
        let start = offset.checked_sub(len)?;
        if len == 0 || self.text.slice(start..offset) != self.placeholder.as_str() {
            return None;
        }
        Some(start..offset)
    }

    fn insert_placeholder(&mut self, offset: usize, marks: FormatState) {
        let len = self.placeholder.chars().count();
        self.text.insert(offset, &self.placeholder);
        self.marks
            .splice(offset..offset, std::iter::repeat_n(marks, len));
        self.select(offset + len, offset + len);
    }
}

impl SelectionPlatform for MemorySurface {
    type Range = MemoryRange;

    fn live_range(&self) -> Option<MemoryRange> {
        self.live.clone()
    }

    fn contains_range(&self, range: &MemoryRange) -> bool {
        match range.container {
            MemoryContainer::Element(node) => node == SURFACE_NODE,
            MemoryContainer::Text { parent } => parent == SURFACE_NODE,
        }
    }

    fn select_range(&mut self, range: &MemoryRange) -> Result<(), PlatformError> {
        if range.generation != self.generation {
            return Err("range refers to nodes that were removed".into());
        }
        if range.end > self.text.len_chars() {
            return Err(format!(
                "range end {} past content length {}",
                range.end,
                self.text.len_chars()
            )
            .into());
        }
        self.live = Some(range.clone());
        Ok(())
    }
}

impl FormatPlatform for MemorySurface {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn focus(&mut self) -> Result<(), PlatformError> {
        self.focus_requests += 1;
        if !self.focused {
            self.focused = true;
            // Focusing without a selection inside puts the caret at the start.
            let inside = self
                .live
                .as_ref()
                .is_some_and(|range| self.contains_range(range));
            if !inside {
                self.select(0, 0);
            }
        }
        Ok(())
    }

    fn toggle_format(&mut self, format: Format) -> Result<(), PlatformError> {
        let range = self.live_in_surface()?;

        if range.is_collapsed() {
            let marks = self.caret_marks(range.start).toggled(format);
            self.insert_placeholder(range.start, marks);
            return Ok(());
        }

        let span = &mut self.marks[range.start..range.end];
        let apply = !span.iter().all(|m| m.is_active(format));
        for marks in span {
            marks.set(format, apply);
        }
        Ok(())
    }

    fn clear_formats(&mut self, formats: &[Format]) -> Result<(), PlatformError> {
        let range = self.live_in_surface()?;

        if range.is_collapsed() {
            let marks = self.caret_marks(range.start);
            if !formats.iter().any(|f| marks.is_active(*f)) {
                return Ok(());
            }
            let cleared = marks.without(formats);
            match self.placeholder_before(range.start) {
                Some(span) => self.marks[span].fill(cleared),
                None => self.insert_placeholder(range.start, cleared),
            }
            return Ok(());
        }

        for marks in &mut self.marks[range.start..range.end] {
            *marks = marks.without(formats);
        }
        Ok(())
    }

    fn query_format(&self, format: Format) -> bool {
        let Ok(range) = self.live_in_surface() else {
            return false;
        };
        if range.is_collapsed() {
            return self.caret_marks(range.start).is_active(format);
        }
        self.marks[range.start..range.end]
            .iter()
            .all(|m| m.is_active(format))
    }

    fn serialized_content(&self) -> String {
        let mut out = String::with_capacity(self.text.len_bytes());
        let mut current = FormatState::NONE;

        for (ch, marks) in self.text.chars().zip(self.marks.iter().copied()) {
            if marks != current {
                close_tags(&mut out, current);
                open_tags(&mut out, marks);
                current = marks;
            }
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                c => out.push(c),
            }
        }
        close_tags(&mut out, current);
        out
    }
}

fn open_tags(out: &mut String, marks: FormatState) {
    for format in marks.active() {
        out.push('<');
        out.push_str(format.tag());
        out.push('>');
    }
}

fn close_tags(out: &mut String, marks: FormatState) {
    let active: Vec<_> = marks.active().collect();
    for format in active.into_iter().rev() {
        out.push_str("</");
        out.push_str(format.tag());
        out.push('>');
    }
}
