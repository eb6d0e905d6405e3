//! Selection capture and restore across focus changes.
//!
//! Clicking a toolbar button moves focus away from the editable surface and
//! the host usually collapses or clears the live selection when it does.
//! `SelectionTracker` keeps the last range that was valid inside the surface
//! so a command can put it back before running.

use web_time::Instant;

use crate::error::FormatError;
use crate::platform::{RangeHandle, SelectionPlatform};

/// A cloned range that was inside the surface when it was captured.
///
/// Holds its own clone of the host range, so later changes to the live
/// selection never reach a snapshot already taken.
#[derive(Clone, Debug)]
pub struct SelectionSnapshot<R> {
    range: R,
    captured_at: Instant,
}

impl<R: RangeHandle> SelectionSnapshot<R> {
    fn new(range: R) -> Self {
        Self {
            range,
            captured_at: Instant::now(),
        }
    }

    pub fn range(&self) -> &R {
        &self.range
    }

    pub fn into_range(self) -> R {
        self.range
    }

    pub fn is_collapsed(&self) -> bool {
        self.range.is_collapsed()
    }

    /// When the snapshot was taken.
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }
}

/// Owns the last valid selection snapshot for one surface.
#[derive(Debug)]
pub struct SelectionTracker<R> {
    snapshot: Option<SelectionSnapshot<R>>,
}

impl<R> Default for SelectionTracker<R> {
    fn default() -> Self {
        Self { snapshot: None }
    }
}

impl<R: RangeHandle> SelectionTracker<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the live selection if it lies inside the surface.
    ///
    /// Overwrites any earlier snapshot. Leaves it untouched (and returns
    /// false) when there is no live selection or it is elsewhere.
    pub fn capture<P>(&mut self, platform: &P) -> bool
    where
        P: SelectionPlatform<Range = R>,
    {
        match self.try_capture(platform) {
            Ok(()) => true,
            Err(e) => {
                tracing::trace!(target: "format_toolbar::selection", error = %e, "capture skipped");
                false
            }
        }
    }

    fn try_capture<P>(&mut self, platform: &P) -> Result<(), FormatError>
    where
        P: SelectionPlatform<Range = R>,
    {
        let range = platform
            .live_range()
            .filter(|range| platform.contains_range(range))
            .ok_or(FormatError::SelectionUnavailable)?;

        tracing::trace!(target: "format_toolbar::selection", ?range, "captured selection");
        self.snapshot = Some(SelectionSnapshot::new(range));
        Ok(())
    }

    /// Re-apply the stored range as the live selection.
    ///
    /// Returns false when nothing was captured or the host rejects the
    /// range, e.g. because its nodes were removed in the meantime.
    pub fn restore<P>(&self, platform: &mut P) -> bool
    where
        P: SelectionPlatform<Range = R>,
    {
        let Some(snapshot) = &self.snapshot else {
            return false;
        };

        let age = snapshot.captured_at.elapsed();
        match platform
            .select_range(&snapshot.range)
            .map_err(FormatError::RestoreFailed)
        {
            Ok(()) => {
                tracing::trace!(target: "format_toolbar::selection", ?age, "restored selection");
                true
            }
            Err(e) => {
                tracing::debug!(target: "format_toolbar::selection", error = %e, ?age, "restore failed");
                false
            }
        }
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// A fresh clone of the stored snapshot.
    pub fn snapshot(&self) -> Option<SelectionSnapshot<R>> {
        self.snapshot.clone()
    }

    pub(crate) fn current(&self) -> Option<&SelectionSnapshot<R>> {
        self.snapshot.as_ref()
    }

    /// Drop the stored snapshot (surface teardown).
    pub fn clear(&mut self) {
        self.snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryContainer, MemorySurface, NodeId, SURFACE_NODE};

    #[test]
    fn test_capture_is_idempotent() {
        let mut surface = MemorySurface::new("hello world");
        surface.select(2, 7);
        let mut tracker = SelectionTracker::new();

        assert!(tracker.capture(&surface));
        let first = tracker.snapshot().unwrap();
        assert!(tracker.capture(&surface));
        let second = tracker.snapshot().unwrap();

        assert!(second.captured_at() >= first.captured_at());
        assert_eq!(first.into_range(), second.into_range());
    }

    #[test]
    fn test_restore_fidelity() {
        let mut surface = MemorySurface::new("hello world");
        surface.select(6, 11);
        let mut tracker = SelectionTracker::new();
        assert!(tracker.capture(&surface));

        // Focus moves to a toolbar button.
        surface.select_outside(NodeId(7));
        assert!(tracker.restore(&mut surface));

        let live = surface.live().unwrap();
        assert_eq!((live.start, live.end), (6, 11));
        assert_eq!(live.container, MemoryContainer::Text { parent: SURFACE_NODE });
    }

    #[test]
    fn test_capture_outside_keeps_previous_snapshot() {
        let mut surface = MemorySurface::new("hello world");
        surface.select(0, 5);
        let mut tracker = SelectionTracker::new();
        assert!(tracker.capture(&surface));

        surface.select_outside(NodeId(3));
        assert!(!tracker.capture(&surface));

        surface.clear_live_selection();
        assert!(!tracker.capture(&surface));

        let kept = tracker.snapshot().unwrap();
        assert_eq!((kept.range().start, kept.range().end), (0, 5));
    }

    #[test]
    fn test_accepts_element_and_text_containers() {
        let mut surface = MemorySurface::new("hello");
        let mut tracker = SelectionTracker::new();

        surface.select_in(MemoryContainer::Element(SURFACE_NODE), 0, 1);
        assert!(tracker.capture(&surface));

        surface.select_in(MemoryContainer::Text { parent: SURFACE_NODE }, 1, 3);
        assert!(tracker.capture(&surface));

        surface.select_in(MemoryContainer::Text { parent: NodeId(9) }, 0, 2);
        assert!(!tracker.capture(&surface));
        assert_eq!(tracker.snapshot().unwrap().range().start, 1);
    }

    #[test]
    fn test_restore_without_snapshot_fails_quietly() {
        let mut surface = MemorySurface::new("hello");
        let tracker = SelectionTracker::new();
        assert!(!tracker.has_snapshot());
        assert!(!tracker.restore(&mut surface));
    }

    #[test]
    fn test_restore_of_removed_nodes_fails_quietly() {
        let mut surface = MemorySurface::new("hello world");
        surface.select(0, 5);
        let mut tracker = SelectionTracker::new();
        assert!(tracker.capture(&surface));

        surface.replace_text("something else");
        assert!(!tracker.restore(&mut surface));
        assert!(surface.live().is_none());
    }

    #[test]
    fn test_snapshot_is_independent_of_live_selection() {
        let mut surface = MemorySurface::new("hello world");
        surface.select(0, 5);
        let mut tracker = SelectionTracker::new();
        tracker.capture(&surface);
        let taken = tracker.snapshot().unwrap();

        surface.select(3, 3);
        assert_eq!((taken.range().start, taken.range().end), (0, 5));
        assert!(!taken.is_collapsed());
    }

    #[test]
    fn test_clear_discards_snapshot() {
        let mut surface = MemorySurface::new("hello");
        surface.select(0, 1);
        let mut tracker = SelectionTracker::new();
        tracker.capture(&surface);
        tracker.clear();
        assert!(!tracker.has_snapshot());
    }
}
